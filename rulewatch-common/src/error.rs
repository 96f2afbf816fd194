//! Error types for the rulewatch workspace.

use thiserror::Error;

/// Result type alias using the rulewatch error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors the CLI maps to distinct exit codes. Engine storage failures have their own
/// types in the core crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Process exit code for CLI surfaces.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => 3,
            Self::Config(_) | Self::InvalidInput(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::NotFound("x".into()).exit_code(), 3);
        assert_eq!(Error::Config("x".into()).exit_code(), 2);
        assert_eq!(Error::InvalidInput("x".into()).exit_code(), 2);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::NotFound("no snapshot for '2026-00001'".into()).to_string(),
            "Not found: no snapshot for '2026-00001'"
        );
    }
}
