// SPDX-License-Identifier: Apache-2.0

use bedtrack_core::{parse_env_bool, ENV_BEDTRACK_LOG_JSON, ENV_BEDTRACK_LOG_LEVEL};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LogFlags {
    pub quiet: bool,
    pub verbose: u8,
}

/// Directive used when no environment variable names one.
fn flag_directive(flags: LogFlags) -> &'static str {
    if flags.quiet {
        return "error";
    }
    match flags.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Explicit `--quiet`/`--verbose` win, then `BEDTRACK_LOG_LEVEL`, then `RUST_LOG`.
fn resolve_filter(flags: LogFlags, lookup: impl Fn(&str) -> Option<String>) -> EnvFilter {
    if flags.quiet || flags.verbose > 0 {
        return EnvFilter::new(flag_directive(flags));
    }
    if let Some(level) = lookup(ENV_BEDTRACK_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(level.trim()) {
            return filter;
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(flag_directive(flags)))
}

/// Installs the process-wide subscriber. Events go to stderr so stdout stays
/// machine-readable. A second call is a no-op.
pub(crate) fn init_tracing(flags: LogFlags) {
    let lookup = |name: &str| std::env::var(name).ok();
    let filter = resolve_filter(flags, lookup);
    let log_json = lookup(ENV_BEDTRACK_LOG_JSON)
        .as_deref()
        .and_then(parse_env_bool)
        .unwrap_or(false);
    let result = if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
