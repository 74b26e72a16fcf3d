//! Error types for roster operations.
//!
//! Only `Permission` is fatal to the process; every other variant is
//! reported to the user at the dispatch or mutation boundary and the
//! session keeps reading.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    UserInput(String),

    #[error("{0}")]
    Validation(String),

    #[error("Cannot open {0}")]
    Resource(PathBuf),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("No targets: {0}")]
    Targeting(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Fatal errors unwind the session loop; everything else is reported
    /// and the loop continues.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Permission(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
