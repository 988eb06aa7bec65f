//! aturno CLI - spreadsheet-backed task store
//!
//! Serves the diagnostic endpoint and runs task/project operations against
//! the configured spreadsheet from the command line.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use aturno_core::{ProjectStatus, TaskStatus};
use aturno_server::Environment;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Parser)]
#[command(name = "aturno")]
#[command(author, version, about = "Spreadsheet-backed task and project store", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load environment variables from this file instead of `./.env`
    #[arg(long, value_name = "FILE", global = true)]
    env_file: Option<PathBuf>,

    /// Use a throwaway in-memory spreadsheet instead of Google Sheets
    #[arg(long, global = true)]
    memory: bool,

    /// Deployment environment; `production` hides error details
    #[arg(long = "env", env = "ATURNO_ENV", default_value = "development", global = true)]
    environment: Environment,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, env = "ATURNO_BIND", default_value = DEFAULT_BIND)]
        bind: String,
    },

    /// Verify configuration and connectivity
    Check,

    /// Create the Tasks and Projects sheets and their header rows
    Init,

    /// Print task and project statistics
    Stats,

    /// Create one sample project and one sample task
    Seed,

    /// Task operations
    #[command(subcommand)]
    Tasks(TaskCommand),

    /// Project operations
    #[command(subcommand)]
    Projects(ProjectCommand),
}

#[derive(Subcommand)]
enum TaskCommand {
    /// List tasks, optionally filtered
    List {
        #[arg(long, conflicts_with_all = ["status", "assignee"])]
        project: Option<String>,

        #[arg(long, conflicts_with = "assignee")]
        status: Option<TaskStatus>,

        #[arg(long)]
        assignee: Option<String>,
    },

    /// Show one task
    Get { id: String },

    /// Find tasks with any field containing TERM (case-insensitive)
    Search { term: String },

    /// Delete a task by id
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// List projects, optionally filtered
    List {
        #[arg(long, conflicts_with = "status")]
        team: Option<String>,

        #[arg(long)]
        status: Option<ProjectStatus>,
    },

    /// Show one project
    Get { id: String },

    /// Find projects with any field containing TERM (case-insensitive)
    Search { term: String },

    /// Delete a project by id
    Delete { id: String },
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "aturno=info,aturno_sheets=warn,aturno_store=info,aturno_server=info,tower_http=info",
        1 => "aturno=debug,aturno_sheets=debug,aturno_store=debug,aturno_server=debug,tower_http=debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Arguments backed by environment variables are re-read once the file is loaded
    if let Some(path) = &cli.env_file {
        dotenvy::from_path(path)
            .with_context(|| format!("Failed to load environment file {}", path.display()))?;
        cli = Cli::parse();
    } else {
        dotenvy::dotenv().ok();
    }

    init_tracing(cli.verbose);

    let backend = commands::backend(cli.memory);
    match cli.command {
        Commands::Serve { bind } => commands::serve(backend, cli.environment, &bind).await,
        Commands::Check => commands::check(&backend).await,
        Commands::Init => commands::init(&backend).await,
        Commands::Stats => commands::stats(&backend).await,
        Commands::Seed => commands::seed(&backend).await,
        Commands::Tasks(command) => commands::tasks(&backend, command).await,
        Commands::Projects(command) => commands::projects(&backend, command).await,
    }
}
