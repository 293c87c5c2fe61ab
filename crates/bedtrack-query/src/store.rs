// SPDX-License-Identifier: Apache-2.0

//! One query surface over the two on-disk layouts.

use bedtrack_core::{StoreConfig, StoreLayout};
use bedtrack_model::{AccessScope, GenomicInterval, Sample, SampleRegionGroup};
use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info_span};

use crate::catalog::SampleCatalog;
use crate::legacy::SingleFileRegionReader;
use crate::overlap::{validate_region_request, RegionOverlapEngine};
use crate::pool::ConnectionPool;
use crate::QueryError;

/// Read operations shared by every store layout.
///
/// Catalog calls default to the primary database; implementations differ only
/// in where region rows come from.
pub trait SampleStore: Send + Sync {
    fn layout(&self) -> StoreLayout;

    fn catalog(&self) -> &SampleCatalog;

    fn list_samples(
        &self,
        assembly: &str,
        platform: Option<&str>,
    ) -> Result<Vec<Sample>, QueryError> {
        self.catalog().list_samples(assembly, platform)
    }

    fn search_samples(
        &self,
        query: &str,
        assembly: &str,
        scope: &AccessScope,
    ) -> Result<Vec<Sample>, QueryError> {
        self.catalog().search_samples(query, assembly, scope)
    }

    fn sample(&self, sample_id: &str, scope: &AccessScope) -> Result<Sample, QueryError> {
        self.catalog().sample(sample_id, scope)
    }

    fn can_view(&self, sample_id: &str, scope: &AccessScope) -> Result<(), QueryError> {
        self.catalog().can_view(sample_id, scope)
    }

    fn genomes(&self) -> Result<Vec<String>, QueryError> {
        self.catalog().genomes()
    }

    fn platforms(&self, assembly: &str, scope: &AccessScope) -> Result<Vec<String>, QueryError> {
        self.catalog().platforms(assembly, scope)
    }

    fn regions(
        &self,
        sample_ids: &[String],
        interval: &GenomicInterval,
        scope: &AccessScope,
    ) -> Result<Vec<SampleRegionGroup>, QueryError> {
        self.regions_across(sample_ids, std::slice::from_ref(interval), scope)
    }

    fn regions_across(
        &self,
        sample_ids: &[String],
        intervals: &[GenomicInterval],
        scope: &AccessScope,
    ) -> Result<Vec<SampleRegionGroup>, QueryError>;
}

/// Catalog and regions both served from the primary database.
#[derive(Debug, Clone)]
pub struct RelationalStore {
    catalog: SampleCatalog,
    engine: RegionOverlapEngine,
}

impl RelationalStore {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            catalog: SampleCatalog::new(Arc::clone(&pool)),
            engine: RegionOverlapEngine::new(pool),
        }
    }

    #[must_use]
    pub fn engine(&self) -> &RegionOverlapEngine {
        &self.engine
    }
}

impl SampleStore for RelationalStore {
    fn layout(&self) -> StoreLayout {
        StoreLayout::Relational
    }

    fn catalog(&self) -> &SampleCatalog {
        &self.catalog
    }

    fn regions_across(
        &self,
        sample_ids: &[String],
        intervals: &[GenomicInterval],
        scope: &AccessScope,
    ) -> Result<Vec<SampleRegionGroup>, QueryError> {
        self.engine.regions_across(sample_ids, intervals, scope)
    }
}

/// Catalog from the primary database, regions from one file per sample at
/// `<root>/<sample url>`.
#[derive(Debug, Clone)]
pub struct PerFileStore {
    catalog: SampleCatalog,
    root: PathBuf,
}

impl PerFileStore {
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>, root: impl Into<PathBuf>) -> Self {
        Self {
            catalog: SampleCatalog::new(pool),
            root: root.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn region_file(&self, sample: &Sample) -> Result<SingleFileRegionReader, QueryError> {
        if sample.url.trim().is_empty() {
            return Err(QueryError::storage(format!(
                "sample {} has no region file",
                sample.public_id
            )));
        }
        let relative = Path::new(&sample.url);
        let escapes_root = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes_root {
            return Err(QueryError::storage(format!(
                "sample {} region file must be a relative path inside the store",
                sample.public_id
            )));
        }
        Ok(SingleFileRegionReader::new(self.root.join(relative)))
    }
}

impl SampleStore for PerFileStore {
    fn layout(&self) -> StoreLayout {
        StoreLayout::PerFile
    }

    fn catalog(&self) -> &SampleCatalog {
        &self.catalog
    }

    /// Authorizes each sample through the catalog, then reads its file.
    /// Groups come back ordered by sample id and regions by chromosome rank
    /// then position, as the relational store orders them.
    fn regions_across(
        &self,
        sample_ids: &[String],
        intervals: &[GenomicInterval],
        scope: &AccessScope,
    ) -> Result<Vec<SampleRegionGroup>, QueryError> {
        validate_region_request(sample_ids, intervals)?;
        let _span = info_span!(
            "regions_per_file",
            samples = sample_ids.len(),
            intervals = intervals.len(),
            admin = scope.is_admin()
        )
        .entered();

        let requested: BTreeSet<&str> = sample_ids.iter().map(String::as_str).collect();
        let mut ranks: HashMap<String, HashMap<String, i64>> = HashMap::new();
        let mut groups = Vec::new();
        for sample_id in requested {
            let Some(sample) = self.catalog.find_visible(sample_id, scope)? else {
                continue;
            };
            let mut regions = self.region_file(&sample)?.overlaps_any(intervals)?;
            if regions.is_empty() {
                continue;
            }
            if !ranks.contains_key(&sample.genome) {
                let genome_ranks = self.catalog.chromosome_ranks(&sample.genome)?;
                ranks.insert(sample.genome.clone(), genome_ranks);
            }
            let genome_ranks = ranks.get(&sample.genome);
            let rank = |chr: &str| {
                genome_ranks
                    .and_then(|r| r.get(chr))
                    .copied()
                    .unwrap_or(i64::MAX)
            };
            regions.sort_by(|a, b| {
                rank(&a.loc.chr)
                    .cmp(&rank(&b.loc.chr))
                    .then_with(|| a.loc.chr.cmp(&b.loc.chr))
                    .then_with(|| a.loc.start.cmp(&b.loc.start))
                    .then_with(|| a.loc.end.cmp(&b.loc.end))
            });
            groups.push(SampleRegionGroup {
                sample: sample.public_id,
                regions,
            });
        }
        debug!(groups = groups.len(), "per-file region query complete");
        Ok(groups)
    }
}

/// Opens the primary database from `cfg` and wraps it in the configured layout.
pub fn open_store(cfg: &StoreConfig) -> Result<Arc<dyn SampleStore>, QueryError> {
    let pool = Arc::new(ConnectionPool::from_config(cfg)?);
    let store: Arc<dyn SampleStore> = match cfg.layout {
        StoreLayout::Relational => Arc::new(RelationalStore::new(pool)),
        StoreLayout::PerFile => Arc::new(PerFileStore::new(pool, cfg.data_dir.clone())),
    };
    debug!(layout = cfg.layout.as_str(), "sample store opened");
    Ok(store)
}
