// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Read-only data model for permission-scoped BED track queries.

mod access;
mod interval;
mod region;
mod request;
mod sample;

pub use access::AccessScope;
pub use interval::{GenomicInterval, ParseError, CHROMOSOME_MAX_LEN};
pub use region::{Region, SampleRegionGroup};
pub use request::{RegionsQuery, RegionsRequest, SearchRequest};
pub use sample::{parse_tags, Sample};

pub const CRATE_NAME: &str = "bedtrack-model";
