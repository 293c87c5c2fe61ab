// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::{
    ENV_BEDTRACK_DATA_DIR, ENV_BEDTRACK_DB_FILE, ENV_BEDTRACK_POOL_SIZE,
    ENV_BEDTRACK_SQLITE_CACHE_KIB, ENV_BEDTRACK_SQLITE_MMAP_BYTES, ENV_BEDTRACK_STORE_LAYOUT,
};

pub const DEFAULT_DATABASE_FILE: &str = "beds.db";

/// Where region rows live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreLayout {
    /// Catalog and regions in the primary database.
    Relational,
    /// Catalog in the primary database, one region file per sample at `<dir>/<url>`.
    PerFile,
}

impl StoreLayout {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::PerFile => "per-file",
        }
    }
}

impl FromStr for StoreLayout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relational" => Ok(Self::Relational),
            "per-file" | "per_file" | "legacy" => Ok(Self::PerFile),
            other => Err(ConfigError(format!(
                "unsupported store layout `{other}`; use relational or per-file"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub layout: StoreLayout,
    pub pool_size: usize,
    pub sqlite_cache_kib: i64,
    pub sqlite_mmap_bytes: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/modules/beds"),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            layout: StoreLayout::Relational,
            pool_size: 4,
            sqlite_cache_kib: 32 * 1024,
            sqlite_mmap_bytes: 256 * 1024 * 1024,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Layers variables from `lookup` over the defaults. Unparseable numbers
    /// keep their default; an unknown layout is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let layout = match non_empty(ENV_BEDTRACK_STORE_LAYOUT) {
            Some(raw) => raw.parse::<StoreLayout>()?,
            None => defaults.layout,
        };
        let pool_size = non_empty(ENV_BEDTRACK_POOL_SIZE)
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.pool_size);

        Ok(Self {
            data_dir: non_empty(ENV_BEDTRACK_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            database_file: non_empty(ENV_BEDTRACK_DB_FILE).unwrap_or(defaults.database_file),
            layout,
            pool_size,
            sqlite_cache_kib: non_empty(ENV_BEDTRACK_SQLITE_CACHE_KIB)
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(defaults.sqlite_cache_kib),
            sqlite_mmap_bytes: non_empty(ENV_BEDTRACK_SQLITE_MMAP_BYTES)
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(defaults.sqlite_mmap_bytes),
        })
    }

    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}
