use serde::Serialize;

use crate::element::{Disposition, ElementKind, ElementState, TestElement};

#[derive(Debug, Clone, Serialize)]
pub struct DispositionRecord {
    pub file: String,
    pub element: String,
    pub name_start: usize,
    pub name_end: usize,
    pub start: usize,
    pub end: usize,
}

impl From<&Disposition> for DispositionRecord {
    fn from(disposition: &Disposition) -> Self {
        Self {
            file: disposition.file.to_string(),
            element: disposition.element.to_string(),
            name_start: disposition.name_span.start,
            name_end: disposition.name_span.end,
            start: disposition.span.start,
            end: disposition.span.end,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ElementRecord {
    pub id: String,
    pub kind: &'static str,
    pub state: ElementState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

impl From<&TestElement> for ElementRecord {
    fn from(element: &TestElement) -> Self {
        let (categories, skip_reason) = match &element.kind {
            ElementKind::Method(method) => (method.categories.clone(), method.skip_reason.clone()),
            _ => (Vec::new(), None),
        };

        Self {
            id: element.id.to_string(),
            kind: element.kind.name(),
            state: element.state,
            parent: element.parent.as_ref().map(ToString::to_string),
            categories,
            skip_reason,
            files: element.files.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanFailure {
    pub file: String,
    pub error: String,
}
