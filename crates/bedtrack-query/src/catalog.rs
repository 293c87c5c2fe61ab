// SPDX-License-Identifier: Apache-2.0

use bedtrack_model::{AccessScope, Sample};
use rusqlite::types::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info_span, warn};
use unicode_normalization::UnicodeNormalization;

use crate::pool::ConnectionPool;
use crate::predicate::{permission_predicate, SqlPredicate};
use crate::row_decode::{decode_sample, SAMPLE_COLUMNS, SAMPLE_FROM};
use crate::QueryError;

const SAMPLE_ORDER: &str = "ORDER BY t.name, d.name, s.name, s.public_id";

/// Sample metadata lookups, scoped by assembly and caller permissions.
#[derive(Debug, Clone)]
pub struct SampleCatalog {
    pool: Arc<ConnectionPool>,
}

impl SampleCatalog {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Every sample of `assembly`, optionally narrowed to one technology.
    /// No permission filter is applied; callers acting for a user go through
    /// [`SampleCatalog::search_samples`].
    pub fn list_samples(
        &self,
        assembly: &str,
        platform: Option<&str>,
    ) -> Result<Vec<Sample>, QueryError> {
        let _span = info_span!("list_samples", assembly, platform = ?platform).entered();
        let mut filter = vec![assembly_predicate(assembly)];
        if let Some(platform) = platform {
            filter.push(SqlPredicate::equals("t.name", "platform", text(platform)));
        }
        self.select_samples(SqlPredicate::all(filter))
    }

    /// Samples of `assembly` visible to `scope` that match `query`.
    ///
    /// A blank query lists everything visible. Otherwise sample and dataset
    /// public ids match exactly and technology, dataset and sample names match
    /// as substrings under Unicode lowercase folding. Name matching runs here
    /// rather than in SQL, whose `LIKE` only folds ASCII.
    pub fn search_samples(
        &self,
        query: &str,
        assembly: &str,
        scope: &AccessScope,
    ) -> Result<Vec<Sample>, QueryError> {
        let query: String = query.trim().nfkc().collect();
        let _span = info_span!("search_samples", assembly, query = %query).entered();
        let visible = self.select_samples(
            permission_predicate(scope).and(assembly_predicate(assembly)),
        )?;
        if query.is_empty() {
            return Ok(visible);
        }
        let needle = fold_case(&query);
        let matches: Vec<Sample> = visible
            .into_iter()
            .filter(|s| {
                s.public_id == query
                    || s.dataset_id == query
                    || [&s.technology, &s.dataset, &s.name]
                        .iter()
                        .any(|name| fold_case(name).contains(&needle))
            })
            .collect();
        debug!(matches = matches.len(), "sample search complete");
        Ok(matches)
    }

    /// Permission-scoped lookup by public id; `None` when the sample is
    /// missing or not visible, which callers must not distinguish.
    pub fn find_visible(
        &self,
        sample_id: &str,
        scope: &AccessScope,
    ) -> Result<Option<Sample>, QueryError> {
        let filter = permission_predicate(scope).and(SqlPredicate::equals(
            "s.public_id",
            "sample_id",
            text(sample_id),
        ));
        Ok(self.select_samples(filter)?.into_iter().next())
    }

    /// Like [`SampleCatalog::find_visible`] but fails closed: a non-admin gets
    /// `PermissionDenied` for both hidden and missing samples.
    pub fn sample(&self, sample_id: &str, scope: &AccessScope) -> Result<Sample, QueryError> {
        match self.find_visible(sample_id, scope)? {
            Some(sample) => Ok(sample),
            None if scope.is_admin() => {
                Err(QueryError::not_found(format!("sample {sample_id} not found")))
            }
            None => Err(QueryError::permission_denied(format!(
                "sample {sample_id} is not viewable"
            ))),
        }
    }

    /// Explicit authorization check, independent of any data retrieval.
    pub fn can_view(&self, sample_id: &str, scope: &AccessScope) -> Result<(), QueryError> {
        let filter = permission_predicate(scope).and(SqlPredicate::equals(
            "s.public_id",
            "sample_id",
            text(sample_id),
        ));
        let sql = format!(
            "SELECT s.public_id FROM samples s JOIN datasets d ON d.id = s.dataset_id WHERE {} LIMIT 1",
            filter.sql()
        );
        let conn = self.pool.acquire()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(filter.bind().as_slice())?;
        let found: Option<String> = match rows.next()? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        if found.as_deref() == Some(sample_id) {
            Ok(())
        } else {
            warn!(sample = sample_id, "sample view denied");
            Err(QueryError::permission_denied(format!(
                "sample {sample_id} is not viewable"
            )))
        }
    }

    /// Distinct genome names, ordered.
    pub fn genomes(&self) -> Result<Vec<String>, QueryError> {
        let conn = self.pool.acquire()?;
        let mut stmt = conn.prepare_cached("SELECT name FROM genomes ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Technologies with at least one sample of `assembly` visible to `scope`.
    pub fn platforms(&self, assembly: &str, scope: &AccessScope) -> Result<Vec<String>, QueryError> {
        let filter = permission_predicate(scope).and(assembly_predicate(assembly));
        let sql = format!(
            "SELECT DISTINCT t.name FROM samples s \
             JOIN datasets d ON d.id = s.dataset_id \
             JOIN assemblies a ON a.id = d.assembly_id \
             JOIN technologies t ON t.id = s.technology_id \
             WHERE {} ORDER BY t.name",
            filter.sql()
        );
        let conn = self.pool.acquire()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let names = stmt
            .query_map(filter.bind().as_slice(), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Chromosome name to rank for one genome.
    pub fn chromosome_ranks(&self, genome: &str) -> Result<HashMap<String, i64>, QueryError> {
        let conn = self.pool.acquire()?;
        let mut stmt = conn.prepare_cached(
            "SELECT c.name, c.id FROM chromosomes c JOIN genomes g ON g.id = c.genome_id \
             WHERE g.name = ?1",
        )?;
        let ranks = stmt
            .query_map([genome], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(ranks)
    }

    fn select_samples(&self, filter: SqlPredicate) -> Result<Vec<Sample>, QueryError> {
        let sql = format!(
            "SELECT {SAMPLE_COLUMNS} {SAMPLE_FROM} WHERE {} {SAMPLE_ORDER}",
            filter.sql()
        );
        let conn = self.pool.acquire()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let samples = stmt
            .query_map(filter.bind().as_slice(), decode_sample)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(rows = samples.len(), "sample query complete");
        Ok(samples)
    }
}

fn assembly_predicate(assembly: &str) -> SqlPredicate {
    SqlPredicate::raw(
        "LOWER(a.name) = LOWER(:assembly)",
        vec![(":assembly".to_string(), text(assembly.trim()))],
    )
}

fn fold_case(value: &str) -> String {
    value.nfkc().collect::<String>().to_lowercase()
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}
