// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{GenomicInterval, ParseError};

/// Body of a regions request as it arrives from the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionsRequest {
    pub location: String,
    pub samples: Vec<String>,
}

/// A regions request whose location parsed and whose sample list is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionsQuery {
    pub interval: GenomicInterval,
    pub samples: Vec<String>,
}

impl RegionsRequest {
    pub fn validate(&self) -> Result<RegionsQuery, ParseError> {
        if self.samples.is_empty() {
            return Err(ParseError::Empty("samples"));
        }
        if self.samples.iter().any(|s| s.trim().is_empty()) {
            return Err(ParseError::InvalidFormat("sample ids must not be blank"));
        }
        Ok(RegionsQuery {
            interval: GenomicInterval::parse(&self.location)?,
            samples: self.samples.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub assembly: String,
    #[serde(default)]
    pub search: String,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.assembly.trim().is_empty() {
            return Err(ParseError::Empty("assembly"));
        }
        Ok(())
    }
}
