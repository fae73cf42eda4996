use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MarqError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Corrupted block: {0}")]
    CorruptedBlock(String),
    #[error("Marks error: {0}")]
    MarksError(String),
    #[error("Seek position out of bound: {0}")]
    SeekOutOfBound(String),
    #[error("Cannot parse readable size: {0}")]
    ReadableSizeError(String),
}

impl MarqError {
    /// Append diagnostic context to an out-of-bound seek error. Every other
    /// kind passes through unchanged so callers can still match on it.
    pub fn with_context(self, context: impl FnOnce() -> String) -> Self {
        match self {
            MarqError::SeekOutOfBound(msg) => {
                MarqError::SeekOutOfBound(format!("{msg} ({})", context()))
            }
            other => other,
        }
    }

    pub fn is_seek_out_of_bound(&self) -> bool {
        matches!(self, MarqError::SeekOutOfBound(_))
    }
}

impl From<std::io::Error> for MarqError {
    fn from(err: std::io::Error) -> Self {
        MarqError::IoError(err.to_string())
    }
}
