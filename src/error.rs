//! Error types for conio
//!
//! Every fallible primitive returns [`Result`]. Queries that hit an
//! unavailable capability (e.g. the terminal size) do not fail; they
//! return a sentinel instead. See the individual primitives.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConioError {
    #[error("no console session is active")]
    SessionNotActive,

    #[error("invalid session state: {0}")]
    InvalidState(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("color pair table exhausted ({0} pairs)")]
    PairsExhausted(u16),

    #[error("input stream is exhausted")]
    InputExhausted,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[source] io::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[cfg(windows)]
    #[error("console API call failed: {0}")]
    Console(#[source] windows::core::Error),
}

pub type Result<T> = std::result::Result<T, ConioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ConioError::SessionNotActive.to_string(),
            "no console session is active"
        );
        assert_eq!(
            ConioError::InvalidState("already initialized").to_string(),
            "invalid session state: already initialized"
        );
        assert_eq!(
            ConioError::PairsExhausted(64).to_string(),
            "color pair table exhausted (64 pairs)"
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: ConioError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, ConioError::Io(_)));
    }
}
