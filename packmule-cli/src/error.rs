//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent
//! formatting and appropriate exit codes.

use packmule::fetch::HttpError;
use packmule::store::StoreError;
use std::fmt;
use std::path::PathBuf;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to load or save the graph store
    Store(StoreError),
    /// Failed to create the HTTP client
    Http(HttpError),
    /// No project in the store matches the given slug
    UnknownProject { slug: String },
    /// A --keep file could not be hashed
    Keep { path: PathBuf, message: String },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        if let CliError::Store(StoreError::Read { .. }) = self {
            eprintln!();
            eprintln!("No store was found. Point --store at an existing");
            eprintln!("packmule-lock.json or run from the bundle directory.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Store(e) => write!(f, "{}", e),
            CliError::Http(e) => write!(f, "{}", e),
            CliError::UnknownProject { slug } => {
                write!(f, "No project in the store matches '{}'", slug)
            }
            CliError::Keep { path, message } => {
                write!(f, "Could not hash {}: {}", path.display(), message)
            }
        }
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}
