// SPDX-License-Identifier: Apache-2.0

use bedtrack_model::{AccessScope, GenomicInterval, Region, SampleRegionGroup};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info_span};

use crate::pool::ConnectionPool;
use crate::predicate::{
    interval_overlap_predicate, permission_predicate, sample_membership_predicate, SqlPredicate,
};
use crate::row_decode::decode_region;
use crate::QueryError;

/// Sample id, then chromosome rank (never the name), then position.
const REGION_ORDER: &str = "ORDER BY s.public_id, c.id, r.start, r.end, r.id";

/// Permission-scoped multi-sample overlap queries against the relational store.
#[derive(Debug, Clone)]
pub struct RegionOverlapEngine {
    pool: Arc<ConnectionPool>,
}

impl RegionOverlapEngine {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Regions of the visible `sample_ids` overlapping `interval`, one group per
    /// sample with at least one match. Denied and empty samples produce no group.
    pub fn regions(
        &self,
        sample_ids: &[String],
        interval: &GenomicInterval,
        scope: &AccessScope,
    ) -> Result<Vec<SampleRegionGroup>, QueryError> {
        self.regions_across(sample_ids, std::slice::from_ref(interval), scope)
    }

    /// As [`RegionOverlapEngine::regions`] over several intervals in one query.
    pub fn regions_across(
        &self,
        sample_ids: &[String],
        intervals: &[GenomicInterval],
        scope: &AccessScope,
    ) -> Result<Vec<SampleRegionGroup>, QueryError> {
        validate_region_request(sample_ids, intervals)?;
        let _span = info_span!(
            "regions",
            samples = sample_ids.len(),
            intervals = intervals.len(),
            admin = scope.is_admin()
        )
        .entered();

        let filter = SqlPredicate::all([
            permission_predicate(scope),
            sample_membership_predicate(sample_ids),
            interval_overlap_predicate(intervals),
        ]);
        let sql = overlap_sql(&filter);

        let conn = self.pool.acquire()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        // Collect fully before grouping so a failing row aborts the whole call.
        let rows = stmt
            .query_map(filter.bind().as_slice(), |row| {
                Ok((row.get::<_, String>(0)?, decode_region(row, 1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let groups = group_by_sample(rows);
        debug!(groups = groups.len(), "region query complete");
        Ok(groups)
    }
}

pub(crate) fn overlap_sql(filter: &SqlPredicate) -> String {
    format!(
        "SELECT s.public_id, c.name, r.start, r.end, r.name, r.score, r.tags \
         FROM regions r \
         JOIN chromosomes c ON c.id = r.chr_id \
         JOIN samples s ON s.id = r.sample_id \
         JOIN datasets d ON d.id = s.dataset_id \
         WHERE {} {REGION_ORDER}",
        filter.sql()
    )
}

/// Shared argument checks for every region entry point; runs before any I/O.
pub fn validate_region_request(
    sample_ids: &[String],
    intervals: &[GenomicInterval],
) -> Result<(), QueryError> {
    if sample_ids.is_empty() {
        return Err(QueryError::invalid_argument(
            "at least 1 sample id must be supplied",
        ));
    }
    validate_intervals(intervals)
}

pub(crate) fn validate_intervals(intervals: &[GenomicInterval]) -> Result<(), QueryError> {
    if intervals.is_empty() {
        return Err(QueryError::invalid_argument(
            "at least 1 interval must be supplied",
        ));
    }
    for interval in intervals {
        if interval.chr.is_empty() {
            return Err(QueryError::invalid_argument("chromosome must not be empty"));
        }
        if interval.start > interval.end {
            return Err(QueryError::invalid_argument(format!(
                "interval {interval} has start > end"
            )));
        }
    }
    Ok(())
}

/// Partitions `(sample id, region)` rows into groups ordered by first
/// appearance, keeping each sample's rows in input order.
///
/// Samples need not arrive contiguously: a sample seen again later is appended
/// to its existing group instead of opening a second one.
#[must_use]
pub fn group_by_sample<I>(rows: I) -> Vec<SampleRegionGroup>
where
    I: IntoIterator<Item = (String, Region)>,
{
    let mut groups: Vec<SampleRegionGroup> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for (sample, region) in rows {
        let slot = match groups.last() {
            Some(last) if last.sample == sample => groups.len() - 1,
            _ => match slots.get(&sample) {
                Some(slot) => *slot,
                None => {
                    slots.insert(sample.clone(), groups.len());
                    groups.push(SampleRegionGroup::new(sample));
                    groups.len() - 1
                }
            },
        };
        groups[slot].regions.push(region);
    }
    groups
}
