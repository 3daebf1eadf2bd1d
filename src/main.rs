use clap::{Parser, Subcommand};
use cwldep::resolver::Operation;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "cwldep")]
#[command(about = "Dependency manager for Common Workflow Language documents")]
#[command(version)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install dependencies, keeping files that still match the lockfile
    Install {
        /// Workflow document declaring the dependencies
        document: PathBuf,
    },
    /// Re-fetch every dependency and move repositories to their declared versions
    Update {
        /// Workflow document declaring the dependencies
        document: PathBuf,
    },
    /// Report what install or update would change without touching anything
    Check {
        /// Workflow document declaring the dependencies
        document: PathBuf,
    },
    /// Install, then delete dependencies the document no longer references
    Clean {
        /// Workflow document declaring the dependencies
        document: PathBuf,
    },
    /// Add a dependency to the document and install
    Add {
        /// Workflow document to edit
        document: PathBuf,
        /// Upstream URL of the dependency
        upstream: String,
        /// Version to record (branch, tag, or commit for repositories)
        #[arg(long)]
        set_version: Option<String>,
        /// Install directory, relative to the document's dependencies
        #[arg(long)]
        install_to: Option<String>,
    },
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("info,cwldep=debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(cli.verbose))
        .init();

    let result = match cli.command {
        Commands::Install { document } => cli::sync::run(document, Operation::Install).await,
        Commands::Update { document } => cli::sync::run(document, Operation::Update).await,
        Commands::Check { document } => cli::sync::run(document, Operation::Check).await,
        Commands::Clean { document } => cli::sync::run(document, Operation::Clean).await,
        Commands::Add {
            document,
            upstream,
            set_version,
            install_to,
        } => cli::add::run(document, upstream, set_version, install_to).await,
    };

    match result {
        Ok(report) => ExitCode::from(report.exit_code()),
        Err(e) => {
            eprintln!("\nError: {}", e);
            ExitCode::FAILURE
        }
    }
}
