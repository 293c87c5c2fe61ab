// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod logging;

use bedtrack_core::{ExitCode, MachineError, StoreConfig, StoreLayout};
use bedtrack_model::{AccessScope, GenomicInterval, RegionsRequest, SearchRequest};
use bedtrack_query::{open_store, QueryError, QueryErrorCode, SampleStore, SingleFileRegionReader};
use clap::{error::ErrorKind, ArgAction, Parser, Subcommand, ValueEnum};
use logging::{init_tracing, LogFlags};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode as ProcessExitCode;
use std::sync::Arc;

pub const CRATE_NAME: &str = "bedtrack-cli";

#[derive(Parser)]
#[command(name = "bedtrack")]
#[command(about = "Permission-scoped BED track queries")]
#[command(
    after_help = "Environment:\n  BEDTRACK_DATA_DIR       Store directory\n  BEDTRACK_DB_FILE        Primary database file name\n  BEDTRACK_STORE_LAYOUT   relational | per-file\n  BEDTRACK_LOG_LEVEL      Log filter override\n  BEDTRACK_LOG_JSON       Emit logs as JSON"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    db_file: Option<String>,
    #[arg(long, global = true, value_enum)]
    layout: Option<LayoutCli>,
    /// Act as an administrator; bypasses dataset permissions.
    #[arg(long, global = true, default_value_t = false)]
    admin: bool,
    /// Permission held by the caller. Repeat or comma-separate for several.
    #[arg(long = "permission", global = true, value_delimiter = ',')]
    permissions: Vec<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutCli {
    Relational,
    PerFile,
}

impl From<LayoutCli> for StoreLayout {
    fn from(value: LayoutCli) -> Self {
        match value {
            LayoutCli::Relational => StoreLayout::Relational,
            LayoutCli::PerFile => StoreLayout::PerFile,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective store configuration.
    Config,
    Genomes,
    /// List every sample of an assembly without permission filtering.
    Samples {
        #[arg(long)]
        assembly: String,
        #[arg(long)]
        platform: Option<String>,
    },
    /// Search samples visible to the caller.
    Search {
        #[arg(long)]
        assembly: String,
        #[arg(long, default_value = "")]
        query: String,
    },
    Platforms {
        #[arg(long)]
        assembly: String,
    },
    Sample {
        id: String,
    },
    CanView {
        id: String,
    },
    /// Regions of the given samples overlapping one or more locations.
    Regions {
        /// `chr:start-end`; repeat to query several intervals at once.
        #[arg(long = "location", required_unless_present = "request")]
        locations: Vec<String>,
        #[arg(long = "sample", required_unless_present = "request")]
        samples: Vec<String>,
        /// JSON `{"location": ..., "samples": [...]}` body; `-` reads stdin.
        #[arg(long, conflicts_with_all = ["locations", "samples"])]
        request: Option<PathBuf>,
    },
    /// Overlap query against one sample's region file, without permission checks.
    FileRegions {
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "location", required = true)]
        locations: Vec<String>,
    },
}

#[derive(Clone, Copy)]
struct OutputMode {
    json: bool,
}

struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    fn usage(message: &str) -> Self {
        Self {
            exit_code: ExitCode::Usage,
            machine: MachineError::new("usage_error", message),
        }
    }

    fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new("internal_error", &message),
        }
    }
}

impl From<QueryError> for CliError {
    fn from(err: QueryError) -> Self {
        let exit_code = match err.code {
            QueryErrorCode::InvalidArgument
            | QueryErrorCode::PermissionDenied
            | QueryErrorCode::NotFound => ExitCode::Validation,
            QueryErrorCode::Storage => ExitCode::DependencyFailure,
            _ => ExitCode::Internal,
        };
        Self {
            exit_code,
            machine: MachineError::new(err.code.as_str(), &err.message),
        }
    }
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new("usage_error", "invalid command line arguments")
                        .with_detail("error", &err.to_string()),
                });
            }
        },
    };
    init_tracing(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
    });
    let output_mode = OutputMode { json: cli.json };
    let command = cli
        .command
        .as_ref()
        .ok_or_else(|| CliError::usage("missing command; see --help"))?;
    let scope = AccessScope::new(
        cli.admin,
        cli.permissions
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty()),
    );
    let config = store_config(&cli)?;

    match command {
        Commands::Config => emit(&config, output_mode),
        Commands::FileRegions { file, locations } => {
            let intervals = parse_locations(locations)?;
            let regions = SingleFileRegionReader::new(file).overlaps_any(&intervals)?;
            emit(&regions, output_mode)
        }
        other => {
            let store = open_store(&config)?;
            run_store_command(other, &store, &scope, output_mode)
        }
    }
}

fn store_config(cli: &Cli) -> Result<StoreConfig, CliError> {
    let mut config = StoreConfig::from_env().map_err(|e| CliError {
        exit_code: ExitCode::Usage,
        machine: MachineError::new("config_error", &e.to_string()),
    })?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(file) = &cli.db_file {
        config.database_file = file.clone();
    }
    if let Some(layout) = cli.layout {
        config.layout = layout.into();
    }
    Ok(config)
}

fn run_store_command(
    command: &Commands,
    store: &Arc<dyn SampleStore>,
    scope: &AccessScope,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    match command {
        Commands::Genomes => emit(&store.genomes()?, output_mode),
        Commands::Samples { assembly, platform } => emit(
            &store.list_samples(assembly, platform.as_deref())?,
            output_mode,
        ),
        Commands::Search { assembly, query } => {
            let request = SearchRequest {
                assembly: assembly.clone(),
                search: query.clone(),
            };
            request.validate().map_err(QueryError::from)?;
            emit(
                &store.search_samples(&request.search, &request.assembly, scope)?,
                output_mode,
            )
        }
        Commands::Platforms { assembly } => emit(&store.platforms(assembly, scope)?, output_mode),
        Commands::Sample { id } => emit(&store.sample(id, scope)?, output_mode),
        Commands::CanView { id } => {
            store.can_view(id, scope)?;
            emit(&json!({ "sample": id, "viewable": true }), output_mode)
        }
        Commands::Regions {
            locations,
            samples,
            request,
        } => {
            let (samples, intervals) = match request {
                Some(path) => {
                    let query = read_regions_request(path)?
                        .validate()
                        .map_err(QueryError::from)?;
                    (query.samples, vec![query.interval])
                }
                None => (samples.clone(), parse_locations(locations)?),
            };
            emit(&store.regions_across(&samples, &intervals, scope)?, output_mode)
        }
        Commands::Config | Commands::FileRegions { .. } => Err(CliError::internal(
            "command does not use the sample store".to_string(),
        )),
    }
}

fn parse_locations(raw: &[String]) -> Result<Vec<GenomicInterval>, CliError> {
    raw.iter()
        .map(|loc| GenomicInterval::parse(loc).map_err(|e| CliError::from(QueryError::from(e))))
        .collect()
}

fn read_regions_request(path: &Path) -> Result<RegionsRequest, CliError> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::usage(&format!("failed to read request from stdin: {e}")))?;
        buf
    } else {
        fs::read_to_string(path).map_err(|e| {
            CliError::usage(&format!("failed to read request {}: {e}", path.display()))
        })?
    };
    serde_json::from_str(&raw).map_err(|e| CliError {
        exit_code: ExitCode::Usage,
        machine: MachineError::new("invalid_request", "request body is not a valid regions request")
            .with_detail("error", &e.to_string()),
    })
}

fn emit<T: Serialize + ?Sized>(payload: &T, output_mode: OutputMode) -> Result<(), CliError> {
    let rendered = if output_mode.json {
        serde_json::to_string(payload)
    } else {
        serde_json::to_string_pretty(payload)
    }
    .map_err(|e| CliError::internal(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("{}", error.machine);
    }
}
