//! Classes declared across a project, indexed for base type lookup.

use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};

use super::declaration::{ClassDeclaration, Declaration, MethodDeclaration};
use crate::element::{FileId, TypeName};

/// One declaration of a class, as far as inheritance needs it.
#[derive(Debug, Clone)]
struct IndexedClass {
    file: FileId,
    type_name: TypeName,
    base_types: Vec<String>,
    methods: Vec<MethodDeclaration>,
}

impl IndexedClass {
    fn new(file: &FileId, class: &ClassDeclaration) -> Self {
        Self {
            file: file.clone(),
            type_name: class.type_name.clone(),
            base_types: class.base_types.clone(),
            methods: class.methods().cloned().collect(),
        }
    }
}

/// Declarations keyed by dotted full name (`Ns.Outer.Inner`), so source
/// references resolve without knowing which segments are types.
#[derive(Debug, Default)]
pub struct TypeIndex {
    types: DashMap<String, Vec<IndexedClass>>,
    files: DashMap<FileId, Vec<String>>,
}

fn dotted(type_name: &TypeName) -> String {
    type_name.full_name().replace('+', ".")
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever `file` declared before with the classes in `root`.
    ///
    /// Each type's entry is rewritten in one map operation, so a type that
    /// is still declared is never briefly missing for concurrent readers.
    pub fn index_file(&self, file: &FileId, root: &Declaration) {
        let mut declared: Vec<(String, Vec<IndexedClass>)> = Vec::new();
        for class in root.classes() {
            let key = dotted(&class.type_name);
            let entry = IndexedClass::new(file, class);
            match declared.iter_mut().find(|(k, _)| *k == key) {
                Some((_, entries)) => entries.push(entry),
                None => declared.push((key, vec![entry])),
            }
        }

        let keys: Vec<String> = declared.iter().map(|(key, _)| key.clone()).collect();
        for (key, entries) in declared {
            let mut slot = self.types.entry(key).or_default();
            slot.retain(|c| &c.file != file);
            slot.extend(entries);
            slot.sort_by(|a, b| a.file.cmp(&b.file));
        }

        let previous = self.files.insert(file.clone(), keys.clone());
        for stale in previous.unwrap_or_default() {
            if keys.contains(&stale) {
                continue;
            }
            if let Some(mut slot) = self.types.get_mut(&stale) {
                slot.retain(|c| &c.file != file);
            }
            self.types.remove_if(&stale, |_, slot| slot.is_empty());
        }
    }

    pub fn contains(&self, type_name: &TypeName) -> bool {
        self.types.contains_key(&dotted(type_name))
    }

    /// Methods declared on `type_name` by every indexed declaration of it.
    pub fn declared_methods(&self, type_name: &TypeName) -> Vec<MethodDeclaration> {
        self.declarations(&dotted(type_name))
            .into_iter()
            .flat_map(|c| c.methods)
            .collect()
    }

    /// Finds the indexed type a base reference written inside `from` names.
    ///
    /// Enclosing namespaces and types are tried innermost first, then the
    /// reference as written, then a unique indexed type ending with it
    /// (a type imported by a `using` directive).
    pub fn resolve(&self, reference: &str, from: &TypeName) -> Option<TypeName> {
        let scope = dotted(from);
        let mut segments: Vec<&str> = scope.split('.').collect();
        segments.pop();

        for depth in (0..=segments.len()).rev() {
            let candidate = if depth == 0 {
                reference.to_string()
            } else {
                format!("{}.{}", segments[..depth].join("."), reference)
            };
            if let Some(type_name) = self.type_name_of(&candidate) {
                return Some(type_name);
            }
        }

        let suffix = format!(".{reference}");
        let mut matches = self
            .types
            .iter()
            .filter(|entry| entry.key().ends_with(&suffix))
            .filter_map(|entry| entry.value().first().map(|c| c.type_name.clone()));
        let found = matches.next()?;
        matches.next().is_none().then_some(found)
    }

    /// Methods `class` inherits from indexed base types, nearest base first.
    ///
    /// A method name declared on the class or on a nearer base hides every
    /// method of that name further up.
    pub fn inherited_methods(&self, class: &TypeName) -> Vec<MethodDeclaration> {
        let own = dotted(class);
        let mut hidden: HashSet<String> = self
            .declarations(&own)
            .into_iter()
            .flat_map(|c| c.methods)
            .map(|m| m.name)
            .collect();
        let mut visited = HashSet::from([own]);
        let mut queue: VecDeque<TypeName> = self.bases_of(class).into();
        let mut inherited = Vec::new();

        while let Some(base) = queue.pop_front() {
            let key = dotted(&base);
            if !visited.insert(key.clone()) {
                continue;
            }

            let methods: Vec<MethodDeclaration> = self
                .declarations(&key)
                .into_iter()
                .flat_map(|c| c.methods)
                .collect();
            let names: Vec<String> = methods.iter().map(|m| m.name.clone()).collect();
            inherited.extend(methods.into_iter().filter(|m| !hidden.contains(&m.name)));
            hidden.extend(names);
            queue.extend(self.bases_of(&base));
        }
        inherited
    }

    fn bases_of(&self, type_name: &TypeName) -> Vec<TypeName> {
        self.declarations(&dotted(type_name))
            .into_iter()
            .flat_map(|c| c.base_types)
            .filter_map(|reference| self.resolve(&reference, type_name))
            .collect()
    }

    fn type_name_of(&self, key: &str) -> Option<TypeName> {
        self.types
            .get(key)
            .and_then(|slot| slot.first().map(|c| c.type_name.clone()))
    }

    /// Cloned out so no shard lock is held across lookups.
    fn declarations(&self, key: &str) -> Vec<IndexedClass> {
        self.types
            .get(key)
            .map(|slot| slot.value().clone())
            .unwrap_or_default()
    }
}
