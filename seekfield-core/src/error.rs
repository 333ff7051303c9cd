//! Error types for seekfield operations

/// Errors that can occur while constructing or driving a cursor
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    /// The byte source handed to a cursor cannot be used
    #[error("Invalid byte source: {0}")]
    InvalidSource(String),

    /// Unrecognised line ending convention
    #[error("Invalid line ending format: {0}")]
    InvalidFormat(String),

    /// A delimiter that can never match, such as the empty string
    #[error("Invalid delimiter: {0}")]
    InvalidDelimiter(String),

    /// IO error during seek/read
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(err.to_string())
    }
}
