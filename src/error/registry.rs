use crate::element::ElementId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown element: {id}")]
    UnknownElement { id: ElementId },

    #[error("element '{id}' is a {found}, expected a {expected}")]
    KindMismatch {
        id: ElementId,
        expected: &'static str,
        found: &'static str,
    },
}

impl RegistryError {
    pub fn unknown_element(id: &ElementId) -> Self {
        Self::UnknownElement { id: id.clone() }
    }

    pub fn kind_mismatch(id: &ElementId, expected: &'static str, found: &'static str) -> Self {
        Self::KindMismatch {
            id: id.clone(),
            expected,
            found,
        }
    }
}
