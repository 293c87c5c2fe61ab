// SPDX-License-Identifier: Apache-2.0

mod support;

use bedtrack_model::{AccessScope, GenomicInterval};
use bedtrack_query::RegionOverlapEngine;
use proptest::prelude::*;
use proptest::test_runner::Config;
use std::collections::BTreeSet;
use support::{StoreBuilder, CHROMOSOMES};

const SAMPLES: [&str; 3] = ["S1", "S2", "S3"];
const PERMISSIONS: [&str; 3] = ["p1", "p2", "p3"];

#[derive(Debug, Clone)]
struct Row {
    sample: usize,
    chr: usize,
    start: u64,
    end: u64,
}

fn row_strategy() -> impl Strategy<Value = Row> {
    (0..SAMPLES.len(), 0..CHROMOSOMES.len(), 0_u64..400, 0_u64..80).prop_map(
        |(sample, chr, start, len)| Row {
            sample,
            chr,
            start,
            end: start + len,
        },
    )
}

/// Each sample sits in its own dataset; dataset `i` carries the permissions
/// whose bit is set in `grants[i]`.
fn build(rows: &[Row], grants: &[u8; 3]) -> support::Fixture {
    let mut builder = StoreBuilder::new();
    for (i, sample) in SAMPLES.iter().enumerate() {
        let perms: Vec<&str> = PERMISSIONS
            .iter()
            .enumerate()
            .filter(|(bit, _)| grants[i] & (1 << bit) != 0)
            .map(|(_, p)| *p)
            .collect();
        let dataset = format!("ds-{sample}");
        builder = builder.dataset(&dataset, &perms).sample(sample, &dataset);
    }
    for (id, row) in rows.iter().enumerate() {
        builder = builder.region(
            SAMPLES[row.sample],
            CHROMOSOMES[row.chr],
            row.start,
            row.end,
            &format!("r{id}"),
        );
    }
    builder.finish()
}

/// Straight scan: visible samples in id order, matching rows by rank then
/// position then insertion order.
fn expected(
    rows: &[Row],
    grants: &[u8; 3],
    scope: &AccessScope,
    chr: usize,
    start: u64,
    end: u64,
) -> Vec<(String, Vec<String>)> {
    let mut out = Vec::new();
    for (i, sample) in SAMPLES.iter().enumerate() {
        let visible = scope.is_admin()
            || PERMISSIONS
                .iter()
                .enumerate()
                .any(|(bit, p)| grants[i] & (1 << bit) != 0 && scope.permissions().contains(*p));
        if !visible {
            continue;
        }
        let mut hits: Vec<(u64, u64, usize)> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.sample == i && r.chr == chr && r.start <= end && r.end >= start)
            .map(|(id, r)| (r.start, r.end, id))
            .collect();
        hits.sort();
        if !hits.is_empty() {
            out.push((
                (*sample).to_string(),
                hits.into_iter().map(|(_, _, id)| format!("r{id}")).collect(),
            ));
        }
    }
    out
}

fn actual(
    engine: &RegionOverlapEngine,
    scope: &AccessScope,
    chr: usize,
    start: u64,
    end: u64,
) -> Vec<(String, Vec<String>)> {
    let requested: Vec<String> = SAMPLES.iter().map(|s| (*s).to_string()).collect();
    let interval = GenomicInterval::new(CHROMOSOMES[chr], start, end).expect("interval");
    engine
        .regions(&requested, &interval, scope)
        .expect("regions")
        .into_iter()
        .map(|g| {
            (
                g.sample,
                g.regions.into_iter().filter_map(|r| r.name).collect(),
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(Config::with_cases(48))]

    #[test]
    fn engine_matches_brute_force_scan(
        rows in prop::collection::vec(row_strategy(), 0..40),
        grants in prop::array::uniform3(0_u8..8),
        held in prop::collection::btree_set(0..PERMISSIONS.len(), 0..=3),
        admin in any::<bool>(),
        chr in 0..CHROMOSOMES.len(),
        start in 0_u64..450,
        len in 0_u64..120
    ) {
        let fx = build(&rows, &grants);
        let engine = RegionOverlapEngine::new(fx.pool.clone());
        let scope = AccessScope::new(admin, held.iter().map(|i| PERMISSIONS[*i]));
        let end = start + len;
        prop_assert_eq!(
            actual(&engine, &scope, chr, start, end),
            expected(&rows, &grants, &scope, chr, start, end)
        );
    }

    #[test]
    fn groups_partition_rows_and_admin_is_a_superset(
        rows in prop::collection::vec(row_strategy(), 1..40),
        grants in prop::array::uniform3(0_u8..8),
        held in prop::collection::btree_set(0..PERMISSIONS.len(), 0..=3),
        chr in 0..CHROMOSOMES.len()
    ) {
        let fx = build(&rows, &grants);
        let engine = RegionOverlapEngine::new(fx.pool.clone());
        let scoped = actual(
            &engine,
            &AccessScope::with_permissions(held.iter().map(|i| PERMISSIONS[*i])),
            chr,
            0,
            1_000,
        );
        let admin = actual(&engine, &AccessScope::admin(), chr, 0, 1_000);

        let mut seen = BTreeSet::new();
        for (sample, regions) in &scoped {
            prop_assert!(seen.insert(sample.clone()), "sample {} grouped twice", sample);
            prop_assert!(!regions.is_empty());
            prop_assert!(admin.contains(&(sample.clone(), regions.clone())));
        }
        let total: usize = admin.iter().map(|(_, r)| r.len()).sum();
        let on_chr = rows.iter().filter(|r| r.chr == chr).count();
        prop_assert_eq!(total, on_chr);
    }
}
