use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read conventions file '{path}': {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("failed to parse conventions file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("unsupported conventions format: {format} (expected json or yaml)")]
    UnsupportedFormat { format: String },

    #[error("conventions must name at least one {what} attribute")]
    MissingAttribute { what: String },
}

impl ConfigError {
    pub fn read_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ReadError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub fn missing_attribute(what: impl Into<String>) -> Self {
        Self::MissingAttribute { what: what.into() }
    }
}
