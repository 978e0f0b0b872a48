use crate::element::FileId;
use thiserror::Error;

/// Precondition violations when building a scan session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("scan session requires a source file")]
    MissingFile,

    #[error("scan session requires a type info provider")]
    MissingProvider,

    #[error("scan session requires an identity registry")]
    MissingRegistry,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The interruption predicate fired. The scan carries no information.
    #[error("scan of {file} was cancelled")]
    Cancelled { file: FileId },
}

impl ScanError {
    pub fn cancelled(file: impl Into<FileId>) -> Self {
        Self::Cancelled { file: file.into() }
    }
}
