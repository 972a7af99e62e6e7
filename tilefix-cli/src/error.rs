//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use tilefix::pipeline::PipelineError;
use tilefix::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// A flag value could not be parsed
    Args(String),
    /// The tile store could not be opened
    StoreOpen(StoreError),
    /// The edit run failed
    Run(PipelineError),
}

impl CliError {
    /// Exit the process with an error message and a nonzero code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Run(PipelineError::Resolve(_)) = self {
            eprintln!();
            eprintln!("Only vector tile datasets (format 'pbf') can be edited.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Args(msg) => write!(f, "{}", msg),
            CliError::StoreOpen(e) => write!(f, "{}", e),
            CliError::Run(e) => write!(f, "{}", e),
        }
    }
}
