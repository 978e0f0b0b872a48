//! Deterministic identity scheme.
//!
//! Every identity is a pure function of type names, member names and (for
//! theories) the owning method's identity, so two scans of unchanged source
//! always produce byte-identical keys.

use crate::element::{ElementId, TypeName};

pub const NAMESPACE: &str = "xunit";

pub fn class_id(type_name: &TypeName) -> ElementId {
    ElementId::new(format!("{NAMESPACE}:{}", type_name.full_name()))
}

/// Methods inherited from a base class are qualified with the base type's
/// short name so they cannot collide with a same-named method of the owner.
///
/// Type names are compared as strings and are assumed unique per project.
pub fn method_id(owner_type: &TypeName, declaring_type: &TypeName, method_name: &str) -> ElementId {
    let base_prefix = if owner_type == declaring_type {
        String::new()
    } else {
        format!("{}.", declaring_type.short_name())
    };

    ElementId::new(format!(
        "{NAMESPACE}:{}.{base_prefix}{method_name}",
        owner_type.full_name()
    ))
}

pub fn inherited_container_id(declaring_type: &TypeName, method_name: &str) -> ElementId {
    ElementId::new(format!(
        "{NAMESPACE}:{}.{method_name}",
        declaring_type.full_name()
    ))
}

/// Strips redundant qualification from a theory row's display name.
///
/// `Ns.T.Method.Case1` and `Ns.T.Method(x: 1)` become `Case1` and
/// `Method(x: 1)` respectively; names without the prefix are kept as-is.
pub fn theory_short_name<'a>(
    raw_name: &'a str,
    declaring_type: &TypeName,
    method_name: &str,
) -> &'a str {
    let type_prefix = format!("{}.", declaring_type.full_name());
    let method_prefix = format!("{type_prefix}{method_name}.");

    raw_name
        .strip_prefix(method_prefix.as_str())
        .or_else(|| raw_name.strip_prefix(type_prefix.as_str()))
        .unwrap_or(raw_name)
}

pub fn theory_id(method_id: &ElementId, short_name: &str) -> ElementId {
    ElementId::new(format!("{method_id}.{short_name}"))
}
