//! xUnit Explorer
//!
//! Incremental discovery of xUnit tests in C# sources, reconciled against a
//! registry of stable test identities so that repeated, partial and
//! interrupted scans never duplicate or lose tests.
pub mod cli;
pub mod config;
pub mod discovery;
pub mod element;
pub mod error;
pub mod logging;
pub mod output;
pub mod parser;
pub mod registry;
pub mod utils;
pub mod workspace;

pub use discovery::{Declaration, ScanReport, ScanSession, TypeInfoProvider, XunitConventions};
pub use element::{Disposition, ElementId, ElementState, FileId, TestElement};
pub use error::{Error, Result};
pub use registry::IdentityRegistry;
pub use workspace::Project;
