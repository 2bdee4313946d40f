//! Unified error handling for the reconciliation engine
//!
//! All failures inside the engine are converted to `ReconError`. Variants are
//! grouped into four public kinds (input, decode, limit, internal) which are
//! what callers key their behavior on; the variant itself carries the detail.

use thiserror::Error;

/// The public error classification surfaced to callers.
///
/// Input, decode, and limit errors are caller-correctable (400-class at an
/// HTTP boundary); internal errors are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Decode,
    Limit,
    Internal,
}

impl ErrorKind {
    /// Stable string form used in logs and API payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input_error",
            ErrorKind::Decode => "decode_error",
            ErrorKind::Limit => "limit_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

/// Main engine error type
#[derive(Error, Debug)]
pub enum ReconError {
    // ==================== Input Errors ====================
    #[error("Missing required mapping field: {0}")]
    MissingMappingField(String),

    #[error("Invalid column mapping: {0}")]
    InvalidMapping(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("Input file is empty after decoding: {0}")]
    EmptyInput(String),

    // ==================== Decode Errors ====================
    #[error("Failed to decode input: {0}")]
    Decode(String),

    #[error("Archive contains no supported entry: {0}")]
    NoArchiveEntry(String),

    // ==================== Limit Errors ====================
    #[error("File exceeds size limit: {path} is {bytes} bytes (limit {limit})")]
    FileTooLarge { path: String, bytes: u64, limit: u64 },

    #[error("Row limit exceeded on side {side}: more than {limit} rows")]
    RowLimitExceeded { side: String, limit: u64 },

    // ==================== Internal Errors ====================
    #[error("Scratch store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReconError {
    /// Returns the public kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconError::MissingMappingField(_)
            | ReconError::InvalidMapping(_)
            | ReconError::UnsupportedExtension(_)
            | ReconError::EmptyInput(_) => ErrorKind::Input,

            ReconError::Decode(_) | ReconError::NoArchiveEntry(_) => ErrorKind::Decode,

            ReconError::FileTooLarge { .. } | ReconError::RowLimitExceeded { .. } => {
                ErrorKind::Limit
            }

            ReconError::Store(_)
            | ReconError::Io(_)
            | ReconError::Serialization(_)
            | ReconError::Config(_)
            | ReconError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// True when the caller can correct the request (400-class)
    pub fn is_client_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal)
    }
}

// ==================== From implementations ====================

impl From<std::io::Error> for ReconError {
    fn from(err: std::io::Error) -> Self {
        ReconError::Io(err.to_string())
    }
}

impl From<sqlx::Error> for ReconError {
    fn from(err: sqlx::Error) -> Self {
        ReconError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(err: serde_json::Error) -> Self {
        ReconError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ReconError {
    fn from(err: config::ConfigError) -> Self {
        ReconError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ReconError::MissingMappingField("lrn".to_string()).kind(),
            ErrorKind::Input
        );
        assert_eq!(
            ReconError::NoArchiveEntry("upload.zip".to_string()).kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            ReconError::RowLimitExceeded {
                side: "a".to_string(),
                limit: 2_000_000
            }
            .kind(),
            ErrorKind::Limit
        );
        assert_eq!(
            ReconError::Store("disk full".to_string()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ReconError::UnsupportedExtension("pdf".to_string()).error_code(),
            "input_error"
        );
        assert_eq!(
            ReconError::Internal("oops".to_string()).error_code(),
            "internal_error"
        );
    }

    #[test]
    fn test_client_error_split() {
        assert!(ReconError::EmptyInput("a.csv".to_string()).is_client_error());
        assert!(ReconError::Decode("bad quoting".to_string()).is_client_error());
        assert!(!ReconError::Io("permission denied".to_string()).is_client_error());
    }
}
