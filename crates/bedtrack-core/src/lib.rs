// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod config;
mod errors;

pub use config::{ConfigError, StoreConfig, StoreLayout, DEFAULT_DATABASE_FILE};
pub use errors::{ExitCode, MachineError};

pub const CRATE_NAME: &str = "bedtrack-core";

pub const ENV_BEDTRACK_LOG_LEVEL: &str = "BEDTRACK_LOG_LEVEL";
pub const ENV_BEDTRACK_LOG_JSON: &str = "BEDTRACK_LOG_JSON";
pub const ENV_BEDTRACK_DATA_DIR: &str = "BEDTRACK_DATA_DIR";
pub const ENV_BEDTRACK_DB_FILE: &str = "BEDTRACK_DB_FILE";
pub const ENV_BEDTRACK_STORE_LAYOUT: &str = "BEDTRACK_STORE_LAYOUT";
pub const ENV_BEDTRACK_POOL_SIZE: &str = "BEDTRACK_POOL_SIZE";
pub const ENV_BEDTRACK_SQLITE_CACHE_KIB: &str = "BEDTRACK_SQLITE_CACHE_KIB";
pub const ENV_BEDTRACK_SQLITE_MMAP_BYTES: &str = "BEDTRACK_SQLITE_MMAP_BYTES";

/// Parses the boolean spellings accepted in environment switches.
#[must_use]
pub fn parse_env_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}
