use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{trace, warn};

use super::declaration::{ClassDeclaration, MethodDeclaration};
use super::provider::{TestMethodStrategy, TypeInfoProvider};
use super::reconciler::StateJournal;
use crate::element::{ElementId, FileId, TypeName};
use crate::registry::IdentityRegistry;

/// A container classified during the current scan.
#[derive(Clone)]
pub struct TouchedClass {
    pub element: ElementId,
    pub strategy: Option<Arc<dyn TestMethodStrategy>>,
}

pub type TouchedClasses = HashMap<TypeName, TouchedClass>;

pub struct TestClassDetector<'a> {
    registry: &'a IdentityRegistry,
    provider: &'a dyn TypeInfoProvider,
    file: &'a FileId,
    assembly_location: &'a Path,
}

impl<'a> TestClassDetector<'a> {
    pub fn new(
        registry: &'a IdentityRegistry,
        provider: &'a dyn TypeInfoProvider,
        file: &'a FileId,
        assembly_location: &'a Path,
    ) -> Self {
        Self {
            registry,
            provider,
            file,
            assembly_location,
        }
    }

    pub fn is_valid_test_class(&self, class: &ClassDeclaration) -> bool {
        self.provider.is_test_container(class) && !self.provider.has_unsupported_runner(class)
    }

    /// Classifies `class`, registering it on first sight in this scan.
    ///
    /// The first time a container is seen, every known child bound to this
    /// file is marked pending; later declarations of the same type (partial
    /// classes) only return the cached element.
    pub fn detect(
        &self,
        class: &ClassDeclaration,
        touched: &mut TouchedClasses,
        journal: &mut StateJournal,
    ) -> Option<ElementId> {
        if let Some(known) = touched.get(&class.type_name) {
            return Some(known.element.clone());
        }

        if !self.is_valid_test_class(class) {
            trace!(class = %class.type_name, "not a test class");
            return None;
        }

        let element = match self
            .registry
            .get_or_create_class(&class.type_name, self.assembly_location)
        {
            Ok(element) => element,
            Err(e) => {
                warn!(class = %class.type_name, error = %e, "cannot register test class");
                return None;
            }
        };

        for child in self.registry.children(&element) {
            if let Some(previous) = self.registry.mark_pending_in_file(&child, self.file) {
                journal.record(child, previous);
            }
        }

        let strategy = self.provider.test_method_strategy(class);
        if strategy.is_none() {
            trace!(class = %class.type_name, "no test method strategy");
        }

        touched.insert(
            class.type_name.clone(),
            TouchedClass {
                element: element.clone(),
                strategy,
            },
        );
        Some(element)
    }
}

pub struct TestMethodDetector<'a> {
    registry: &'a IdentityRegistry,
    provider: &'a dyn TypeInfoProvider,
    file: &'a FileId,
}

impl<'a> TestMethodDetector<'a> {
    pub fn new(
        registry: &'a IdentityRegistry,
        provider: &'a dyn TypeInfoProvider,
        file: &'a FileId,
    ) -> Self {
        Self {
            registry,
            provider,
            file,
        }
    }

    /// Members of types not classified in this scan are skipped, so
    /// containers must be detected before their members. A confirmed method
    /// is re-bound to the scanned file; its previous state and binding go to
    /// `journal`.
    pub fn detect(
        &self,
        method: &MethodDeclaration,
        touched: &TouchedClasses,
        journal: &mut StateJournal,
    ) -> Option<ElementId> {
        let class = touched.get(&method.containing_type)?;
        self.confirm(class, method, journal)
    }

    /// Confirms `method`, declared on a base type of `owner`, as a member
    /// of `owner`.
    pub fn detect_inherited(
        &self,
        owner: &TypeName,
        method: &MethodDeclaration,
        touched: &TouchedClasses,
        journal: &mut StateJournal,
    ) -> Option<ElementId> {
        let class = touched.get(owner)?;
        self.confirm(class, method, journal)
    }

    fn confirm(
        &self,
        class: &TouchedClass,
        method: &MethodDeclaration,
        journal: &mut StateJournal,
    ) -> Option<ElementId> {
        let strategy = class.strategy.as_ref()?;
        if !strategy.is_test_method(method) {
            return None;
        }

        let skip_reason = self.provider.skip_reason(method);
        let traits = self.provider.traits(method);

        match self.registry.get_or_create_method_in_file(
            &class.element,
            &method.containing_type,
            &method.name,
            skip_reason.as_deref(),
            &traits,
            self.file,
        ) {
            Ok(confirmation) => {
                if let Some(prior) = confirmation.prior {
                    journal.record_confirmation(&confirmation.id, prior);
                }
                Some(confirmation.id)
            }
            Err(e) => {
                warn!(
                    class = %class.element,
                    method = %method.name,
                    error = %e,
                    "cannot register test method"
                );
                None
            }
        }
    }
}
