mod config;
mod io;
mod parser;
mod registry;
mod session;

pub use config::ConfigError;
pub use io::IoError;
pub use parser::ParserError;
pub use registry::RegistryError;
pub use session::{ScanError, SessionError};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl Error {
    /// True when the failure only means "scan again later".
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Scan(ScanError::Cancelled { .. }))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
