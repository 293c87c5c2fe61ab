// SPDX-License-Identifier: Apache-2.0

use bedtrack_model::{GenomicInterval, Region};
use rusqlite::types::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::overlap::validate_intervals;
use crate::pool::open_readonly;
use crate::predicate::{clamp_i64, SqlPredicate, INTERVAL_PARAM_PREFIX};
use crate::row_decode::decode_region;
use crate::QueryError;

/// Overlap reader for a single sample's dedicated region file.
///
/// The file holds one `regions(chr, start, end, score, name, tags)` table and
/// no permission data; callers authorize before reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleFileRegionReader {
    path: PathBuf,
}

impl SingleFileRegionReader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Regions overlapping `interval`, ordered by start.
    pub fn overlaps(&self, interval: &GenomicInterval) -> Result<Vec<Region>, QueryError> {
        self.overlaps_any(std::slice::from_ref(interval))
    }

    /// Regions overlapping any of `intervals`, each returned once.
    ///
    /// The file is opened read-only for this call and closed before returning.
    pub fn overlaps_any(&self, intervals: &[GenomicInterval]) -> Result<Vec<Region>, QueryError> {
        validate_intervals(intervals)?;
        let filter = file_overlap_predicate(intervals);
        let sql = format!(
            "SELECT r.chr, r.start, r.end, r.name, r.score, r.tags FROM regions r \
             WHERE {} ORDER BY r.chr, r.start, r.end",
            filter.sql()
        );
        let conn = open_readonly(&self.path)?;
        let regions = {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(filter.bind().as_slice(), |row| decode_region(row, 0))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        conn.close().map_err(|(_, e)| QueryError::from(e))?;
        debug!(path = %self.path.display(), rows = regions.len(), "region file read");
        Ok(regions)
    }
}

fn file_overlap_predicate(intervals: &[GenomicInterval]) -> SqlPredicate {
    SqlPredicate::any(intervals.iter().enumerate().map(|(i, interval)| {
        let chr = format!(":{INTERVAL_PARAM_PREFIX}_chr_{i}");
        let start = format!(":{INTERVAL_PARAM_PREFIX}_start_{i}");
        let end = format!(":{INTERVAL_PARAM_PREFIX}_end_{i}");
        SqlPredicate::raw(
            format!("r.chr = {chr} AND r.start <= {end} AND r.end >= {start}"),
            vec![
                (chr, Value::Text(interval.chr.clone())),
                (start, Value::Integer(clamp_i64(interval.start))),
                (end, Value::Integer(clamp_i64(interval.end))),
            ],
        )
    }))
}
