use std::sync::Arc;

use super::declaration::{ClassDeclaration, Declaration, MethodDeclaration};
use crate::element::FileId;
use crate::registry::TraitMap;

/// Decides which members of one test class are test methods.
pub trait TestMethodStrategy: Send + Sync {
    fn is_test_method(&self, method: &MethodDeclaration) -> bool;
}

/// Type and member metadata the scan engine consumes.
///
/// Implementations answer from whatever model the front end produced; the
/// engine never inspects attributes or modifiers itself.
pub trait TypeInfoProvider: Send + Sync {
    fn is_test_container(&self, class: &ClassDeclaration) -> bool;

    /// A custom runner the engine cannot drive disqualifies the container.
    fn has_unsupported_runner(&self, class: &ClassDeclaration) -> bool;

    /// `None` means the class can never contain test methods.
    fn test_method_strategy(&self, class: &ClassDeclaration) -> Option<Arc<dyn TestMethodStrategy>>;

    fn skip_reason(&self, method: &MethodDeclaration) -> Option<String>;

    fn traits(&self, method: &MethodDeclaration) -> TraitMap;

    /// Records the classes `file` declares, replacing what it declared
    /// before. Providers without a project-wide view ignore it.
    fn index_declarations(&self, _file: &FileId, _root: &Declaration) {}

    /// Test methods `class` inherits, each with its declaring base type as
    /// `containing_type`.
    fn inherited_test_methods(&self, _class: &ClassDeclaration) -> Vec<MethodDeclaration> {
        Vec::new()
    }
}
