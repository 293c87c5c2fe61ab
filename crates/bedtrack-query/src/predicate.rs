// SPDX-License-Identifier: Apache-2.0

//! Composable SQL boolean fragments with named, bound parameters.
//!
//! Every value that originates from a caller travels as a parameter; fragment
//! text only ever contains column names chosen by this crate. Builders prefix
//! their parameter names (`:perm_0`, `:sample_0`, ...) so fragments from
//! different builders can be conjoined without renaming.

use bedtrack_model::{AccessScope, GenomicInterval};
use rusqlite::types::{ToSql, Value};
use std::collections::HashSet;

pub const PERMISSION_PARAM_PREFIX: &str = "perm";
pub const SAMPLE_PARAM_PREFIX: &str = "sample";
pub const INTERVAL_PARAM_PREFIX: &str = "loc";

/// Alias the dataset table must carry in any query using [`permission_predicate`].
pub const DATASET_ID_COLUMN: &str = "d.id";

const TAUTOLOGY: &str = "1 = 1";
const CONTRADICTION: &str = "1 = 0";

#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
    sql: String,
    params: Vec<(String, Value)>,
}

impl SqlPredicate {
    #[must_use]
    pub fn tautology() -> Self {
        Self::raw(TAUTOLOGY, Vec::new())
    }

    #[must_use]
    pub fn contradiction() -> Self {
        Self::raw(CONTRADICTION, Vec::new())
    }

    pub(crate) fn raw(sql: impl Into<String>, params: Vec<(String, Value)>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// `column = :name`.
    #[must_use]
    pub fn equals(column: &str, name: &str, value: Value) -> Self {
        Self::raw(
            format!("{column} = :{name}"),
            vec![(format!(":{name}"), value)],
        )
    }

    /// `column IN (:prefix_0, ...)`, one parameter per distinct value in input
    /// order. An empty input is an explicit contradiction, never `IN ()`.
    #[must_use]
    pub fn in_list<I, S>(column: &str, prefix: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let mut params = Vec::new();
        for value in values {
            let value = value.into();
            if !seen.insert(value.clone()) {
                continue;
            }
            let name = format!(":{prefix}_{}", params.len());
            names.push(name.clone());
            params.push((name, Value::Text(value)));
        }
        if params.is_empty() {
            return Self::contradiction();
        }
        Self::raw(format!("{column} IN ({})", names.join(", ")), params)
    }

    #[must_use]
    pub fn and(self, other: SqlPredicate) -> Self {
        Self::all([self, other])
    }

    /// Conjunction of all parts; an empty input is a tautology.
    #[must_use]
    pub fn all<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = SqlPredicate>,
    {
        Self::join(parts, " AND ", TAUTOLOGY)
    }

    /// Disjunction of all parts; an empty input is a contradiction.
    #[must_use]
    pub fn any<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = SqlPredicate>,
    {
        Self::join(parts, " OR ", CONTRADICTION)
    }

    fn join<I>(parts: I, separator: &str, empty: &str) -> Self
    where
        I: IntoIterator<Item = SqlPredicate>,
    {
        let mut clauses = Vec::new();
        let mut params: Vec<(String, Value)> = Vec::new();
        for part in parts {
            debug_assert!(
                part.params
                    .iter()
                    .all(|(name, _)| params.iter().all(|(existing, _)| existing != name)),
                "parameter name collision while composing predicates"
            );
            clauses.push(format!("({})", part.sql));
            params.extend(part.params);
        }
        if clauses.is_empty() {
            return Self::raw(empty, Vec::new());
        }
        Self::raw(clauses.join(separator), params)
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.sql == TAUTOLOGY
    }

    #[must_use]
    pub fn is_contradiction(&self) -> bool {
        self.sql == CONTRADICTION
    }

    pub(crate) fn bind(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

/// Visibility filter for `(is_admin, permissions)` over [`DATASET_ID_COLUMN`].
///
/// Admins get a tautology. Everyone else sees datasets holding at least one of
/// their permissions; an empty permission set matches nothing. The subquery
/// form keeps one output row per dataset even when several permissions match.
#[must_use]
pub fn permission_predicate(scope: &AccessScope) -> SqlPredicate {
    if scope.is_admin() {
        return SqlPredicate::tautology();
    }
    let names = SqlPredicate::in_list(
        "p.name",
        PERMISSION_PARAM_PREFIX,
        scope.permissions().iter().cloned(),
    );
    if names.is_contradiction() {
        return names;
    }
    SqlPredicate::raw(
        format!(
            "{DATASET_ID_COLUMN} IN (SELECT dp.dataset_id FROM dataset_permissions dp \
             JOIN permissions p ON p.id = dp.permission_id WHERE {})",
            names.sql
        ),
        names.params,
    )
}

/// `s.public_id IN (...)` over the requested sample ids.
#[must_use]
pub fn sample_membership_predicate(sample_ids: &[String]) -> SqlPredicate {
    SqlPredicate::in_list("s.public_id", SAMPLE_PARAM_PREFIX, sample_ids.iter().cloned())
}

/// Closed-interval overlap against `c.name`, `r.start`, `r.end`; several
/// intervals are OR-ed so a region matching two of them is returned once.
#[must_use]
pub fn interval_overlap_predicate(intervals: &[GenomicInterval]) -> SqlPredicate {
    SqlPredicate::any(intervals.iter().enumerate().map(|(i, interval)| {
        let chr = format!(":{INTERVAL_PARAM_PREFIX}_chr_{i}");
        let start = format!(":{INTERVAL_PARAM_PREFIX}_start_{i}");
        let end = format!(":{INTERVAL_PARAM_PREFIX}_end_{i}");
        SqlPredicate::raw(
            format!("c.name = {chr} AND r.start <= {end} AND r.end >= {start}"),
            vec![
                (chr, Value::Text(interval.chr.clone())),
                (start, Value::Integer(clamp_i64(interval.start))),
                (end, Value::Integer(clamp_i64(interval.end))),
            ],
        )
    }))
}

pub(crate) fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
