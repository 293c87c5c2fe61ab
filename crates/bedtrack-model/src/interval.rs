// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const CHROMOSOME_MAX_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidFormat(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Inclusive `[start, end]` range on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenomicInterval {
    pub chr: String,
    pub start: u64,
    pub end: u64,
}

impl GenomicInterval {
    pub fn new(chr: impl Into<String>, start: u64, end: u64) -> Result<Self, ParseError> {
        let chr = chr.into();
        if chr.is_empty() {
            return Err(ParseError::Empty("chromosome"));
        }
        if chr.len() > CHROMOSOME_MAX_LEN {
            return Err(ParseError::TooLong("chromosome", CHROMOSOME_MAX_LEN));
        }
        if chr.chars().any(char::is_whitespace) {
            return Err(ParseError::InvalidFormat(
                "chromosome must not contain whitespace",
            ));
        }
        if start > end {
            return Err(ParseError::InvalidFormat("interval start must be <= end"));
        }
        Ok(Self { chr, start, end })
    }

    /// Parses `chr:start-end`. Thousands separators in the coordinates are ignored.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::Empty("location"));
        }
        let (chr, rest) = input.split_once(':').ok_or(ParseError::InvalidFormat(
            "location must be in chr:start-end format",
        ))?;
        let (start_raw, end_raw) = rest.split_once('-').ok_or(ParseError::InvalidFormat(
            "location must be in chr:start-end format",
        ))?;
        let start = parse_coordinate(start_raw)
            .ok_or(ParseError::InvalidFormat("location start must be an integer"))?;
        let end = parse_coordinate(end_raw)
            .ok_or(ParseError::InvalidFormat("location end must be an integer"))?;
        Self::new(chr, start, end)
    }

    /// Overlap test for an inclusive `[start, end]` on the same chromosome.
    #[must_use]
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        start <= self.end && end >= self.start
    }

    #[must_use]
    pub fn overlaps_interval(&self, other: &GenomicInterval) -> bool {
        self.chr == other.chr && self.overlaps(other.start, other.end)
    }

    #[must_use]
    pub fn canonical_string(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start, self.end)
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}

fn parse_coordinate(raw: &str) -> Option<u64> {
    let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()
}
