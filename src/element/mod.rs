//! Test element data model.
//!
//! Elements are owned by the [`IdentityRegistry`](crate::registry::IdentityRegistry)
//! and addressed everywhere else through [`ElementId`] handles, so parent and
//! child links never form ownership cycles.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable identity of a test element, e.g. `xunit:Ns.CalculatorTests.Adds`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Fully-qualified CLR type name (`Ns.Outer+Inner`, generic arity as `` `1``).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self(full_name.into())
    }

    pub fn full_name(&self) -> &str {
        &self.0
    }

    /// Last segment of the full name, nested types included.
    pub fn short_name(&self) -> &str {
        self.0.rsplit(['.', '+']).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of a source file inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileId(PathBuf);

impl FileId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl From<&str> for FileId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&Path> for FileId {
    fn from(value: &Path) -> Self {
        Self::new(value)
    }
}

impl From<PathBuf> for FileId {
    fn from(value: PathBuf) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Byte range inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Valid,
    Pending,
    Invalid,
}

impl ElementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementState::Valid => "valid",
            ElementState::Pending => "pending",
            ElementState::Invalid => "invalid",
        }
    }

    /// Only valid elements may be handed to a test runner.
    pub fn is_runnable(&self) -> bool {
        matches!(self, ElementState::Valid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassElement {
    pub type_name: TypeName,
    pub assembly_location: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodElement {
    pub declaring_type: TypeName,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TheoryElement {
    pub short_name: String,
}

/// A test method declared on a base class and surfaced through a derived
/// class that has not been scanned itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritedMethodContainerElement {
    pub declaring_type: TypeName,
    pub method_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    Class(ClassElement),
    Method(MethodElement),
    Theory(TheoryElement),
    InheritedMethodContainer(InheritedMethodContainerElement),
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Class(_) => "class",
            ElementKind::Method(_) => "method",
            ElementKind::Theory(_) => "theory",
            ElementKind::InheritedMethodContainer(_) => "inherited_method_container",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestElement {
    pub id: ElementId,
    pub state: ElementState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementId>,
    /// Files the element was last confirmed in. Empty means "any file".
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub files: BTreeSet<FileId>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl TestElement {
    pub fn new(id: ElementId, parent: Option<ElementId>, kind: ElementKind) -> Self {
        Self {
            id,
            state: ElementState::Valid,
            parent,
            children: Vec::new(),
            files: BTreeSet::new(),
            kind,
        }
    }

    pub fn as_class(&self) -> Option<&ClassElement> {
        match &self.kind {
            ElementKind::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodElement> {
        match &self.kind {
            ElementKind::Method(method) => Some(method),
            _ => None,
        }
    }

    pub fn as_theory(&self) -> Option<&TheoryElement> {
        match &self.kind {
            ElementKind::Theory(theory) => Some(theory),
            _ => None,
        }
    }

    /// Classes and methods are confirmed by declaration scans; theory rows
    /// and inherited-method containers are recorded from outside.
    pub fn is_declared(&self) -> bool {
        matches!(self.kind, ElementKind::Class(_) | ElementKind::Method(_))
    }

    /// Null-means-any: an element with no recorded file is eligible everywhere.
    pub fn is_in_file(&self, file: &FileId) -> bool {
        self.files.is_empty() || self.files.contains(file)
    }

    pub(crate) fn add_child(&mut self, child: ElementId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }
}

/// Binds a confirmed element to its source location for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disposition {
    pub element: ElementId,
    pub file: FileId,
    pub name_span: Span,
    pub span: Span,
}
