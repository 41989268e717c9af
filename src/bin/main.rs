//! Starforge CLI - derive star schemas from configured sources
//!
//! Usage:
//!   starforge run [--config <file>] [--output <dir>]
//!   starforge modules [--config <file>]
//!   starforge validate [--config <file>]
//!
//! Without configured connections, `STARFORGE_SOURCE_TYPE` and
//! `STARFORGE_CONNECTION` name a single source.
//!
//! Logging is controlled by `STARFORGE_LOG` (an `EnvFilter` directive,
//! default `starforge=info`) and `STARFORGE_LOG_FORMAT=json`.

use clap::{Parser, Subcommand};
use starforge::config::{ConnectionSettings, Settings};
use starforge::pipeline::{EngineBuilder, ModuleRegistry};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "starforge")]
#[command(about = "Starforge - derive candidate star schemas from relational sources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every phase and write generated scripts
    Run {
        /// Config file (defaults to the standard lookup)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered modules per phase
    Modules {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build the pipeline without running it
    Validate {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("STARFORGE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("starforge=info"));
    let json = std::env::var("STARFORGE_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_settings(config: Option<PathBuf>) -> Result<Settings, ExitCode> {
    let result = match config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let mut settings = result.map_err(|e| {
        eprintln!("Configuration error: {}", e);
        ExitCode::FAILURE
    })?;
    if settings.connections.is_empty() {
        if let Ok(connection) = ConnectionSettings::from_env() {
            settings.connections.push(connection);
        }
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => cmd_run(config, output).await,
        Commands::Modules { config } => cmd_modules(config),
        Commands::Validate { config } => cmd_validate(config),
    }
}

async fn cmd_run(config: Option<PathBuf>, output: Option<PathBuf>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let registry = match ModuleRegistry::builtin(&settings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Build error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let engine = match EngineBuilder::build(&settings, &registry) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Build error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output_dir = output.unwrap_or_else(|| settings.output_dir.clone());
    match engine.run(&output_dir).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Pipeline error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_modules(config: Option<PathBuf>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let registry = match ModuleRegistry::builtin(&settings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Build error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut phase = None;
    for module in registry.describe() {
        if phase != Some(module.phase) {
            println!("{}:", module.phase);
            phase = Some(module.phase);
        }
        let requires = if module.requires.is_empty() {
            "-".to_string()
        } else {
            module.requires.join(", ")
        };
        let affects = if module.affects.is_empty() {
            "-".to_string()
        } else {
            module.affects.join(", ")
        };
        println!("  - {} (requires: {}; affects: {})", module.key, requires, affects);
    }
    ExitCode::SUCCESS
}

fn cmd_validate(config: Option<PathBuf>) -> ExitCode {
    let settings = match load_settings(config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let built = ModuleRegistry::builtin(&settings)
        .and_then(|registry| EngineBuilder::build(&settings, &registry));
    match built {
        Ok(engine) => {
            println!("✓ Pipeline is valid");
            println!("  refinement: {}", engine.refinement_keys().join(" -> "));
            println!("  dimension: {}", engine.dimension_keys().join(" -> "));
            println!("  star refinement: {}", engine.star_refinement_keys().join(" -> "));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}
