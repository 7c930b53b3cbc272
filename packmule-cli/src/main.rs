//! Packmule CLI - command-line driver.
//!
//! Loads the bundle's graph store, runs fetch and prune passes over it,
//! and prints accumulated per-item errors after each run. Exit code is 0
//! on success and 1 on unhandled errors; partial fetch failures are
//! reported but do not fail the invocation.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use std::path::PathBuf;

/// Default store file name inside the bundle working directory.
const STORE_FILE: &str = "packmule-lock.json";

#[derive(Parser)]
#[command(name = "packmule")]
#[command(version = packmule::VERSION)]
#[command(about = "Manage game content bundles", long_about = None)]
struct Args {
    /// Bundle working directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Store file (defaults to <dir>/packmule-lock.json)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download every artifact the store resolves to
    Fetch {
        /// Retry budget for failed transfers (capped at 3)
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },
    /// Delete orphaned files from the output tree
    Prune {
        /// Report what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Hand-placed file to keep; may be given multiple times
        #[arg(long = "keep")]
        keep: Vec<PathBuf>,
    },
    /// List the projects in the store
    List {
        /// Show artifacts, sizes, and hashes
        #[arg(short, long)]
        detailed: bool,
    },
    /// Show which projects require the given project
    Deps {
        /// Project slug on any platform
        slug: String,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _guard = match packmule::logging::init_logging("logs", "packmule.log") {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let store_path = args
        .store
        .unwrap_or_else(|| args.dir.join(STORE_FILE));

    let result = match args.command {
        Command::Fetch { retries } => commands::fetch(&args.dir, &store_path, retries).await,
        Command::Prune { dry_run, keep } => {
            commands::prune(&args.dir, &store_path, dry_run, &keep).await
        }
        Command::List { detailed } => commands::list(&store_path, detailed),
        Command::Deps { slug } => commands::deps(&store_path, &slug),
    };

    if let Err(e) = result {
        e.exit();
    }
}
