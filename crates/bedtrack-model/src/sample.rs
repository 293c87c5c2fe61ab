// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Track metadata as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub public_id: String,
    #[serde(skip)]
    pub internal_id: i64,
    pub genome: String,
    pub assembly: String,
    pub technology: String,
    pub dataset_id: String,
    pub dataset: String,
    pub name: String,
    #[serde(rename = "type")]
    pub sample_type: String,
    #[serde(skip)]
    pub url: String,
    pub tags: Vec<String>,
    /// Region count recorded at ingest; `-1` when it was never computed.
    pub regions: i64,
}

/// Splits a comma-delimited tag column into a sorted, deduplicated list.
/// Tag values compare case-sensitively.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
