// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::GenomicInterval;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub loc: GenomicInterval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The regions of one sample that matched a single query, in query order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRegionGroup {
    pub sample: String,
    pub regions: Vec<Region>,
}

impl SampleRegionGroup {
    #[must_use]
    pub fn new(sample: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            regions: Vec::new(),
        }
    }
}
