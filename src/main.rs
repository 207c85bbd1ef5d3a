mod builder;
mod commands;
mod config;
mod diagnostics;
mod error;
mod freshness;
mod graph;
mod hasher;
mod info;
mod interface;
mod manifest;
mod parser;
mod reference;
mod resolver;
mod types;
mod validator;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Exit code for fatal errors that stop a command before it produces a result.
const FATAL: u8 = 2;

/// Command-line interface.
#[derive(Parser)]
#[command(
    name = "islc",
    version,
    about = "Validate ISL documents and build their interface and build-context artifacts"
)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build every document in dependency order and write the manifest
    Build,
    /// Compare documents against the last build's manifest
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show syntax, rules, workflow, and current project state
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the build order grouped into independent levels
    Order {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a document with its references recursively inlined
    Resolve {
        /// Recursion bound (defaults to `max_depth` from .islc.toml)
        #[arg(long)]
        depth: Option<usize>,
        /// Document to resolve
        file: PathBuf,
    },
    /// Validate one document
    Validate {
        /// Document to validate
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Build, then rebuild whenever a document changes
    Watch,
}

/// Send logs to stderr, filtered by `RUST_LOG` (default `islc=info`).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_err| return "islc=info".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Parse arguments, run the command, and map the outcome to an exit code.
fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build => commands::build(),
        Commands::Check { json } => commands::check(json),
        Commands::Info { json } => {
            commands::info(json);
            Ok(ExitCode::SUCCESS)
        },
        Commands::Order { json } => commands::order(json).map(|()| return ExitCode::SUCCESS),
        Commands::Resolve { depth, file } => commands::resolve(&file, depth).map(|()| return ExitCode::SUCCESS),
        Commands::Validate { file, json, strict } => commands::validate(&file, json, strict),
        Commands::Watch => watch::run(),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(FATAL)
        },
    };
}
