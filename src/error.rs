//! Error types for wordlist generation
//!
//! Every failure aborts the run; nothing here is retried.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the generation core
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Unknown `?x` escape or a trailing `?`
    #[error("Invalid mask '{mask}': {reason}")]
    InvalidMask { mask: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Write worker stopped unexpectedly: {0}")]
    WriterDisconnected(String),
}

impl GeneratorError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn mask(mask: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMask {
            mask: mask.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_keeps_source() {
        let err = GeneratorError::io("/tmp/x.txt", io::Error::new(io::ErrorKind::NotFound, "gone"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("gone"));
        assert!(err.to_string().contains("x.txt"));
    }

    #[test]
    fn test_mask_error_message() {
        let err = GeneratorError::mask("?x", "unknown charset '?x'");
        assert_eq!(err.to_string(), "Invalid mask '?x': unknown charset '?x'");
    }
}
