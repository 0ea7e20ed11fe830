//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use tracksim::config::ConfigFileError;
use tracksim::kml::KmlError;
use tracksim::sink::SinkError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// No usable input was found
    NoInput(&'static str),
    /// Failed to read a KML document
    Ingest(KmlError),
    /// Failed to start a sink
    Sink(SinkError),
    /// Every track runner died
    AllTracksFailed,
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::NoInput(_) => {
                eprintln!();
                eprintln!("Pass one or more KML files or directories, for example:");
                eprintln!("  tracksim routes/ --udp localhost:10110");
            }
            CliError::Sink(_) => {
                eprintln!();
                eprintln!("Check that the sink target is reachable and writable.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::NoInput(msg) => write!(f, "{}", msg),
            CliError::Ingest(e) => write!(f, "Failed to load tracks: {}", e),
            CliError::Sink(e) => write!(f, "Failed to start sink: {}", e),
            CliError::AllTracksFailed => write!(f, "All track runners failed"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ingest(e) => Some(e),
            CliError::Sink(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<KmlError> for CliError {
    fn from(e: KmlError) -> Self {
        CliError::Ingest(e)
    }
}

impl From<SinkError> for CliError {
    fn from(e: SinkError) -> Self {
        CliError::Sink(e)
    }
}
