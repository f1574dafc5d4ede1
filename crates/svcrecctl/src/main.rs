//! svcrecctl - CLI for service failure-recovery reconciliation.
//!
//! Reads current state through the service-control tool, diffs it against
//! a desired-state document and applies the difference.

mod audit;
mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use svcrec::{ReconcileSession, ScExe, DEFAULT_SC_PROGRAM};

#[derive(Parser)]
#[command(name = "svcrecctl")]
#[command(about = "Reconcile Windows service failure-recovery settings", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the service-control tool
    #[arg(long, global = true, default_value = DEFAULT_SC_PROGRAM)]
    sc: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the recovery configuration of one service
    Status {
        /// Service name
        service: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List installed services
    List {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export configured services as a desired-state document
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show what apply would change, without mutating anything
    Diff {
        /// Desired-state document
        #[arg(long)]
        file: PathBuf,

        /// Restrict to these services (default: all in the document)
        services: Vec<String>,

        /// Emit the plans as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Bring services to their desired recovery state
    Apply {
        /// Desired-state document
        #[arg(long)]
        file: PathBuf,

        /// Restrict to these services (default: all in the document)
        services: Vec<String>,

        /// Plan and report without executing mutations
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let session = ReconcileSession::new(ScExe::new(cli.sc));

    match cli.command {
        Commands::Status { service, json } => commands::handle_status(session, &service, json),
        Commands::List { json } => commands::handle_list(session, json),
        Commands::Export { output } => commands::handle_export(session, output.as_deref()),
        Commands::Diff {
            file,
            services,
            json,
        } => commands::handle_diff(session, &file, &services, json),
        Commands::Apply {
            file,
            services,
            dry_run,
        } => commands::handle_apply(session, &file, &services, dry_run),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
