//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;
use tileharvest::config::ConfigFileError;
use tileharvest::coord::CoordError;
use tileharvest::harvest::SetupError;
use tileharvest::input::InputError;
use tileharvest::provider::ProviderError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read the input CSV
    Input(InputError),
    /// Failed to create the HTTP client
    Provider(ProviderError),
    /// Failed to prepare the harvester
    Setup(SetupError),
    /// The coordinate cannot be addressed
    Coordinate(CoordError),
    /// The run stopped after local write failures
    Persistence { failures: usize, output_dir: PathBuf },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Persistence { .. } | CliError::Setup(SetupError::Store(_)) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Disk full: free space on the output volume");
                eprintln!("  2. Permissions: make sure the output directory is writable");
                eprintln!("Tiles already written are kept; re-running resumes where it stopped.");
            }
            CliError::Input(InputError::MissingColumn(_)) => {
                eprintln!();
                eprintln!("Use --lat-column / --lon-column or set [input] in config.ini");
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
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Input(e) => write!(f, "Failed to read input: {}", e),
            CliError::Provider(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Setup(e) => write!(f, "Failed to prepare harvest: {}", e),
            CliError::Coordinate(e) => write!(f, "Invalid coordinate: {}", e),
            CliError::Persistence {
                failures,
                output_dir,
            } => write!(
                f,
                "Harvest stopped after {} write failure(s) in '{}'",
                failures,
                output_dir.display()
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Input(e) => Some(e),
            CliError::Provider(e) => Some(e),
            CliError::Setup(e) => Some(e),
            CliError::Coordinate(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<InputError> for CliError {
    fn from(e: InputError) -> Self {
        CliError::Input(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e)
    }
}

impl From<SetupError> for CliError {
    fn from(e: SetupError) -> Self {
        CliError::Setup(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coordinate(e)
    }
}
