//! Error types for tagweight

use thiserror::Error;

/// tagweight error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed calibration row or formula
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid setup: unknown working point, missing calibration rows,
    /// evaluation before configuration, degenerate simulated efficiency.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Query outside the calibrated domain of a category
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// Degenerate result or non-finite input during evaluation
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let e = Error::Configuration("unknown working point: Ultra".into());
        assert_eq!(e.to_string(), "Configuration error: unknown working point: Ultra");
        let e = Error::Lookup("no entries".into());
        assert!(e.to_string().starts_with("Lookup error"));
    }

    #[test]
    fn test_io_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
    }
}
