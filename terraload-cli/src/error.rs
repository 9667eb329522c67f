//! CLI error handling with user-friendly messages.

use std::process;
use terraload::config::ConfigFileError;
use terraload::request::FetchError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(std::io::Error),

    /// Configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),

    /// Invalid command-line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failed to set up the HTTP client
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(FetchError),

    /// Failed to start the async runtime
    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),

    /// One or more fetches did not succeed
    #[error("{failed} of {total} requests did not complete")]
    FetchIncomplete { failed: usize, total: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Config(_) = self {
            eprintln!();
            eprintln!("Check the file with: terraload config");
        }

        process::exit(1)
    }
}

pub type CliResult<T> = Result<T, CliError>;
