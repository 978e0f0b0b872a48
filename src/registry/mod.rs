//! Identity registry shared by every scan session of a project.
//!
//! The registry is the only owner of [`TestElement`]s. It is a sharded
//! concurrent map keyed by identity: each get-or-create is a single atomic
//! entry operation on its own key, so scans of unrelated files never contend
//! on a global lock and two scans racing on one identity observe the same
//! element. No operation holds more than one map guard at a time.

pub mod categories;
pub mod identity;

pub use categories::{derive_categories, TraitMap};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, trace};

use crate::element::{
    ClassElement, ElementId, ElementKind, ElementState, FileId, InheritedMethodContainerElement,
    MethodElement, TestElement, TheoryElement, TypeName,
};
use crate::error::RegistryError;

/// State and file binding an existing element had before a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prior {
    pub state: ElementState,
    pub files: BTreeSet<FileId>,
}

/// Result of a get-or-create that binds the element to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub id: ElementId,
    /// `None` when the element was created by this call.
    pub prior: Option<Prior>,
}

#[derive(Debug, Default)]
pub struct IdentityRegistry {
    elements: DashMap<ElementId, TestElement>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_class(
        &self,
        type_name: &TypeName,
        assembly_location: &Path,
    ) -> Result<ElementId, RegistryError> {
        let id = identity::class_id(type_name);

        match self.elements.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                let element = entry.get_mut();
                match &mut element.kind {
                    // Switching build configuration moves the assembly.
                    ElementKind::Class(class) => {
                        class.assembly_location = assembly_location.to_path_buf();
                    }
                    other => return Err(RegistryError::kind_mismatch(&id, "class", other.name())),
                }
                element.state = ElementState::Valid;
                trace!(id = %id, "revalidated test class");
            }
            Entry::Vacant(entry) => {
                entry.insert(TestElement::new(
                    id.clone(),
                    None,
                    ElementKind::Class(ClassElement {
                        type_name: type_name.clone(),
                        assembly_location: assembly_location.to_path_buf(),
                    }),
                ));
                debug!(id = %id, "registered test class");
            }
        }

        Ok(id)
    }

    pub fn get_or_create_method(
        &self,
        owner: &ElementId,
        declaring_type: &TypeName,
        method_name: &str,
        skip_reason: Option<&str>,
        traits: &TraitMap,
    ) -> Result<ElementId, RegistryError> {
        self.confirm_method(owner, declaring_type, method_name, skip_reason, traits, None)
            .map(|confirmation| confirmation.id)
    }

    /// Like [`get_or_create_method`](Self::get_or_create_method), re-binding
    /// the method to `file` under the same entry lock so a concurrent scan of
    /// another file never observes it unbound. Reports what the element
    /// looked like before, so the caller can undo the confirmation.
    pub fn get_or_create_method_in_file(
        &self,
        owner: &ElementId,
        declaring_type: &TypeName,
        method_name: &str,
        skip_reason: Option<&str>,
        traits: &TraitMap,
        file: &FileId,
    ) -> Result<Confirmation, RegistryError> {
        self.confirm_method(owner, declaring_type, method_name, skip_reason, traits, Some(file))
    }

    fn confirm_method(
        &self,
        owner: &ElementId,
        declaring_type: &TypeName,
        method_name: &str,
        skip_reason: Option<&str>,
        traits: &TraitMap,
        file: Option<&FileId>,
    ) -> Result<Confirmation, RegistryError> {
        let owner_type = self.class_type_name(owner)?;
        let id = identity::method_id(&owner_type, declaring_type, method_name);
        let categories = derive_categories(traits);

        let prior = match self.elements.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                let element = entry.get_mut();
                match &mut element.kind {
                    ElementKind::Method(method) => {
                        method.categories = categories;
                        method.skip_reason = skip_reason.map(str::to_string);
                    }
                    other => {
                        return Err(RegistryError::kind_mismatch(&id, "method", other.name()))
                    }
                }
                let prior = Prior {
                    state: std::mem::replace(&mut element.state, ElementState::Valid),
                    files: element.files.clone(),
                };
                if let Some(file) = file {
                    element.files.clear();
                    element.files.insert(file.clone());
                }
                trace!(id = %id, "revalidated test method");
                Some(prior)
            }
            Entry::Vacant(entry) => {
                let mut element = TestElement::new(
                    id.clone(),
                    Some(owner.clone()),
                    ElementKind::Method(MethodElement {
                        declaring_type: declaring_type.clone(),
                        name: method_name.to_string(),
                        skip_reason: skip_reason.map(str::to_string),
                        categories,
                    }),
                );
                element.files.extend(file.cloned());
                entry.insert(element);
                debug!(id = %id, "registered test method");
                None
            }
        };

        self.adopt(owner, &id)?;
        Ok(Confirmation { id, prior })
    }

    /// Resolves a data row reported for a theory method, creating it on first sight.
    pub fn get_or_create_theory(
        &self,
        owner: &ElementId,
        raw_name: &str,
    ) -> Result<ElementId, RegistryError> {
        let (id, short_name) = self.theory_id_for(owner, raw_name)?;

        match self.elements.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                let element = entry.get_mut();
                if element.as_theory().is_none() {
                    return Err(RegistryError::kind_mismatch(
                        &id,
                        "theory",
                        element.kind.name(),
                    ));
                }
                element.state = ElementState::Valid;
            }
            Entry::Vacant(entry) => {
                entry.insert(TestElement::new(
                    id.clone(),
                    Some(owner.clone()),
                    ElementKind::Theory(TheoryElement { short_name }),
                ));
                debug!(id = %id, "registered theory row");
            }
        }

        self.adopt(owner, &id)?;
        Ok(id)
    }

    /// Looks up a theory row without creating it.
    pub fn find_theory(&self, owner: &ElementId, raw_name: &str) -> Option<ElementId> {
        let (id, _) = self.theory_id_for(owner, raw_name).ok()?;
        self.elements
            .get(&id)
            .filter(|element| element.as_theory().is_some())
            .map(|_| id)
    }

    pub fn get_or_create_inherited_container(
        &self,
        declaring_type: &TypeName,
        method_name: &str,
    ) -> Result<ElementId, RegistryError> {
        let id = identity::inherited_container_id(declaring_type, method_name);

        match self.elements.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                let element = entry.get_mut();
                if !matches!(element.kind, ElementKind::InheritedMethodContainer(_)) {
                    return Err(RegistryError::kind_mismatch(
                        &id,
                        "inherited_method_container",
                        element.kind.name(),
                    ));
                }
                element.state = ElementState::Valid;
            }
            Entry::Vacant(entry) => {
                entry.insert(TestElement::new(
                    id.clone(),
                    None,
                    ElementKind::InheritedMethodContainer(InheritedMethodContainerElement {
                        declaring_type: declaring_type.clone(),
                        method_name: method_name.to_string(),
                    }),
                ));
                debug!(id = %id, "registered inherited method container");
            }
        }

        Ok(id)
    }

    /// Links `child` under `parent`. A child without an owner takes `parent` as owner.
    pub fn adopt(&self, parent: &ElementId, child: &ElementId) -> Result<(), RegistryError> {
        if !self.elements.contains_key(child) {
            return Err(RegistryError::unknown_element(child));
        }

        self.elements
            .get_mut(parent)
            .ok_or_else(|| RegistryError::unknown_element(parent))?
            .add_child(child.clone());

        if let Some(mut element) = self.elements.get_mut(child) {
            if element.parent.is_none() {
                element.parent = Some(parent.clone());
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &ElementId) -> Option<TestElement> {
        self.elements.get(id).map(|element| element.clone())
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn state(&self, id: &ElementId) -> Option<ElementState> {
        self.elements.get(id).map(|element| element.state)
    }

    /// Returns the previous state, or `None` for an unknown element.
    pub fn set_state(&self, id: &ElementId, state: ElementState) -> Option<ElementState> {
        self.elements
            .get_mut(id)
            .map(|mut element| std::mem::replace(&mut element.state, state))
    }

    pub fn compare_and_set_state(
        &self,
        id: &ElementId,
        expected: ElementState,
        state: ElementState,
    ) -> bool {
        match self.elements.get_mut(id) {
            Some(mut element) if element.state == expected => {
                element.state = state;
                true
            }
            _ => false,
        }
    }

    pub fn children(&self, id: &ElementId) -> Vec<ElementId> {
        self.elements
            .get(id)
            .map(|element| element.children.clone())
            .unwrap_or_default()
    }

    /// Records that `id` was confirmed in `file`, keeping earlier files.
    /// Returns true when `file` was not recorded before.
    pub fn add_file(&self, id: &ElementId, file: &FileId) -> bool {
        self.elements
            .get_mut(id)
            .is_some_and(|mut element| element.files.insert(file.clone()))
    }

    pub fn remove_file(&self, id: &ElementId, file: &FileId) -> bool {
        self.elements
            .get_mut(id)
            .is_some_and(|mut element| element.files.remove(file))
    }

    /// Replaces the binding of `id` with `files`, but only while it is still
    /// bound to exactly `file`.
    pub fn restore_files(&self, id: &ElementId, file: &FileId, files: BTreeSet<FileId>) -> bool {
        match self.elements.get_mut(id) {
            Some(mut element) if element.files.len() == 1 && element.files.contains(file) => {
                element.files = files;
                true
            }
            _ => false,
        }
    }

    /// Records that `id` was confirmed in `file` and nowhere else.
    pub fn rebind_file(&self, id: &ElementId, file: &FileId) {
        if let Some(mut element) = self.elements.get_mut(id) {
            element.files.clear();
            element.files.insert(file.clone());
        }
    }

    pub fn is_in_file(&self, id: &ElementId, file: &FileId) -> bool {
        self.elements
            .get(id)
            .is_some_and(|element| element.is_in_file(file))
    }

    /// Marks `id` pending when it belongs to `file`; returns the state it had.
    ///
    /// Only declared elements take part: theory rows and inherited-method
    /// containers are never reconfirmed by a declaration scan.
    pub fn mark_pending_in_file(&self, id: &ElementId, file: &FileId) -> Option<ElementState> {
        let mut element = self.elements.get_mut(id)?;
        if !element.is_declared() || !element.is_in_file(file) {
            return None;
        }
        Some(std::mem::replace(&mut element.state, ElementState::Pending))
    }

    pub fn invalidate_if_pending(&self, id: &ElementId) -> bool {
        self.compare_and_set_state(id, ElementState::Pending, ElementState::Invalid)
    }

    /// Invalidates `id` when it is a pending declared element of `file`.
    pub fn invalidate_if_pending_in_file(&self, id: &ElementId, file: &FileId) -> bool {
        match self.elements.get_mut(id) {
            Some(mut element)
                if element.is_declared()
                    && element.is_in_file(file)
                    && element.state == ElementState::Pending =>
            {
                element.state = ElementState::Invalid;
                true
            }
            _ => false,
        }
    }

    /// Removes an element and everything beneath it.
    pub fn evict(&self, id: &ElementId) -> Option<TestElement> {
        let (_, element) = self.elements.remove(id)?;

        if let Some(parent) = &element.parent {
            if let Some(mut parent) = self.elements.get_mut(parent) {
                parent.children.retain(|child| child != id);
            }
        }

        let mut stack = element.children.clone();
        while let Some(child) = stack.pop() {
            if let Some((_, removed)) = self.elements.remove(&child) {
                stack.extend(removed.children);
            }
        }

        debug!(id = %id, "evicted element");
        Some(element)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self.elements.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// All elements ordered by identity.
    pub fn snapshot(&self) -> Vec<TestElement> {
        let mut elements: Vec<TestElement> =
            self.elements.iter().map(|e| e.value().clone()).collect();
        elements.sort_by(|a, b| a.id.cmp(&b.id));
        elements
    }

    fn class_type_name(&self, id: &ElementId) -> Result<TypeName, RegistryError> {
        let element = self
            .elements
            .get(id)
            .ok_or_else(|| RegistryError::unknown_element(id))?;
        element
            .as_class()
            .map(|class| class.type_name.clone())
            .ok_or_else(|| RegistryError::kind_mismatch(id, "class", element.kind.name()))
    }

    fn theory_id_for(
        &self,
        owner: &ElementId,
        raw_name: &str,
    ) -> Result<(ElementId, String), RegistryError> {
        let (declaring_type, method_name) = {
            let element = self
                .elements
                .get(owner)
                .ok_or_else(|| RegistryError::unknown_element(owner))?;
            let method = element.as_method().ok_or_else(|| {
                RegistryError::kind_mismatch(owner, "method", element.kind.name())
            })?;
            (method.declaring_type.clone(), method.name.clone())
        };

        let short_name = identity::theory_short_name(raw_name, &declaring_type, &method_name);
        Ok((identity::theory_id(owner, short_name), short_name.to_string()))
    }
}
