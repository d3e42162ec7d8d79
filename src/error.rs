//! Application-level errors for the `odc` binary.

use odc_onedrive::ConsoleError;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// A console operation failed.
    Console(ConsoleError),
    /// Terminal or listener I/O failed.
    Io(std::io::Error),
    /// Invalid configuration or arguments.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console(e) => write!(f, "{}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConsoleError> for AppError {
    fn from(err: ConsoleError) -> Self {
        Self::Console(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
