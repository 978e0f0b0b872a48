//! Incremental test discovery over a declaration tree.
//!
//! A [`ScanSession`] walks one file's [`Declaration`] tree, asks a
//! [`TypeInfoProvider`] which declarations are tests, confirms them in the
//! shared [`IdentityRegistry`](crate::registry::IdentityRegistry) and
//! invalidates whatever a previous scan of the same file saw but this one
//! did not.

pub mod conventions;
pub mod declaration;
pub mod detector;
pub mod hierarchy;
pub mod provider;
pub mod reconciler;
pub mod session;

pub use conventions::XunitConventions;
pub use declaration::{
    Attribute, AttributeArgument, ClassDeclaration, Declaration, MethodDeclaration,
    OtherDeclaration,
};
pub use detector::{TestClassDetector, TestMethodDetector, TouchedClass, TouchedClasses};
pub use hierarchy::TypeIndex;
pub use provider::{TestMethodStrategy, TypeInfoProvider};
pub use reconciler::{StateJournal, StateReconciler};
pub use session::{ScanReport, ScanSession, ScanSessionBuilder};
