use std::sync::Arc;

use super::declaration::{Attribute, ClassDeclaration, Declaration, MethodDeclaration};
use super::hierarchy::TypeIndex;
use super::provider::{TestMethodStrategy, TypeInfoProvider};
use crate::config::Conventions;
use crate::element::FileId;
use crate::registry::TraitMap;

/// Attribute-driven xUnit rules over the parsed declaration model.
///
/// Classes of every scanned file are indexed, so partial declarations and
/// base classes declared in other files count towards a container.
#[derive(Debug, Clone)]
pub struct XunitConventions {
    conventions: Arc<Conventions>,
    index: Arc<TypeIndex>,
}

impl XunitConventions {
    pub fn new(conventions: Conventions) -> Self {
        Self {
            conventions: Arc::new(conventions),
            index: Arc::new(TypeIndex::new()),
        }
    }

    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    pub fn index(&self) -> &TypeIndex {
        &self.index
    }

    fn any_named(attributes: &[Attribute], names: &[String]) -> bool {
        attributes
            .iter()
            .any(|attr| names.iter().any(|name| attr.is_named(name)))
    }
}

impl Default for XunitConventions {
    fn default() -> Self {
        Self::new(Conventions::default())
    }
}

impl TypeInfoProvider for XunitConventions {
    fn is_test_container(&self, class: &ClassDeclaration) -> bool {
        if Self::any_named(&class.attributes, &self.conventions.runner_attributes) {
            return true;
        }
        if class.has_modifier("abstract") || class.has_modifier("static") {
            return false;
        }
        let other_declarations = self.index.declared_methods(&class.type_name);
        class
            .methods()
            .chain(&other_declarations)
            .any(|method| is_test_method(&self.conventions, method))
            || !self.inherited_test_methods(class).is_empty()
    }

    fn has_unsupported_runner(&self, class: &ClassDeclaration) -> bool {
        Self::any_named(&class.attributes, &self.conventions.runner_attributes)
    }

    fn test_method_strategy(&self, class: &ClassDeclaration) -> Option<Arc<dyn TestMethodStrategy>> {
        // Open generic classes cannot be instantiated by the runner.
        if class.type_parameters > 0 {
            return None;
        }
        Some(Arc::new(FactStrategy {
            conventions: Arc::clone(&self.conventions),
        }))
    }

    fn skip_reason(&self, method: &MethodDeclaration) -> Option<String> {
        let skip = self.conventions.skip_argument.as_str();
        method
            .attributes
            .iter()
            .filter(|attr| {
                self.conventions
                    .test_attributes()
                    .any(|name| attr.is_named(name))
            })
            .find_map(|attr| attr.named(skip))
            .map(str::to_string)
    }

    fn traits(&self, method: &MethodDeclaration) -> TraitMap {
        let mut traits = TraitMap::new();
        for attr in &method.attributes {
            if !Self::any_named(std::slice::from_ref(attr), &self.conventions.trait_attributes) {
                continue;
            }
            let positional: Vec<&str> = attr.positional().collect();
            if let [key, value] = positional.as_slice() {
                traits
                    .entry((*key).to_string())
                    .or_default()
                    .push((*value).to_string());
            }
        }
        traits
    }

    fn index_declarations(&self, file: &FileId, root: &Declaration) {
        self.index.index_file(file, root);
    }

    fn inherited_test_methods(&self, class: &ClassDeclaration) -> Vec<MethodDeclaration> {
        self.index
            .inherited_methods(&class.type_name)
            .into_iter()
            .filter(|method| is_test_method(&self.conventions, method))
            .collect()
    }
}

/// Recognises fact and theory methods.
struct FactStrategy {
    conventions: Arc<Conventions>,
}

impl TestMethodStrategy for FactStrategy {
    fn is_test_method(&self, method: &MethodDeclaration) -> bool {
        is_test_method(&self.conventions, method)
    }
}

fn is_test_method(conventions: &Conventions, method: &MethodDeclaration) -> bool {
    !method.has_modifier("abstract")
        && method
            .attributes
            .iter()
            .any(|attr| conventions.test_attributes().any(|name| attr.is_named(name)))
}
