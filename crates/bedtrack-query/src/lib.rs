// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Permission-scoped sample catalog and genomic region-overlap queries over
//! read-only SQLite BED stores.

mod catalog;
mod legacy;
mod overlap;
mod pool;
mod predicate;
mod query_error;
mod row_decode;
mod store;

pub use catalog::SampleCatalog;
pub use legacy::SingleFileRegionReader;
pub use overlap::{group_by_sample, validate_region_request, RegionOverlapEngine};
pub use pool::{ConnectionPool, PooledConnection, ReadonlyPragmas};
pub use predicate::{
    interval_overlap_predicate, permission_predicate, sample_membership_predicate, SqlPredicate,
    DATASET_ID_COLUMN, INTERVAL_PARAM_PREFIX, PERMISSION_PARAM_PREFIX, SAMPLE_PARAM_PREFIX,
};
pub use query_error::{QueryError, QueryErrorCode};
pub use store::{open_store, PerFileStore, RelationalStore, SampleStore};

pub const CRATE_NAME: &str = "bedtrack-query";
