use thiserror::Error;

use crate::parsing::engine::ReaderState;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format{}: {message}", line_suffix(.line))]
    InvalidFormat {
        line: Option<usize>,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Reader is {0}, expected open")]
    NotOpen(ReaderState),

    #[error("Too many records: {0} exceeds configured maximum")]
    TooManyRecords(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|n| format!(" at line {n}")).unwrap_or_default()
}

impl Error {
    /// Format error with no line attached yet
    pub fn format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            line: None,
            message: message.into(),
        }
    }

    /// Attach a 1-based line number to a format error that lacks one
    #[must_use]
    pub fn at_line(self, number: usize) -> Self {
        match self {
            Self::InvalidFormat { line: None, message } => Self::InvalidFormat {
                line: Some(number),
                message,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = Error::format("bad field");
        assert_eq!(err.to_string(), "Invalid format: bad field");

        let err = err.at_line(7);
        assert_eq!(err.to_string(), "Invalid format at line 7: bad field");
    }

    #[test]
    fn test_at_line_keeps_first_line() {
        let err = Error::format("bad").at_line(3).at_line(9);
        match err {
            Error::InvalidFormat { line, .. } => assert_eq!(line, Some(3)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_at_line_ignores_other_variants() {
        let err = Error::NotFound("chr9".to_string()).at_line(4);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: chr9");
    }
}
