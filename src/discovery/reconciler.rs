use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

use crate::element::{ElementId, ElementState, FileId};
use crate::registry::{IdentityRegistry, Prior};

/// Invalidates children of a container that a completed walk of one file
/// never reconfirmed.
pub struct StateReconciler<'a> {
    registry: &'a IdentityRegistry,
    file: &'a FileId,
}

impl<'a> StateReconciler<'a> {
    pub fn new(registry: &'a IdentityRegistry, file: &'a FileId) -> Self {
        Self { registry, file }
    }

    /// Turns every pending direct child of `container` that belongs to this
    /// file into `Invalid`. Children pending for a concurrent scan of another
    /// file are left to that scan, and adopted inherited-method containers
    /// are never touched. Elements are never removed here.
    pub fn sweep(&self, container: &ElementId) -> Vec<ElementId> {
        let invalidated: Vec<ElementId> = self
            .registry
            .children(container)
            .into_iter()
            .filter(|child| self.registry.invalidate_if_pending_in_file(child, self.file))
            .collect();

        if !invalidated.is_empty() {
            debug!(
                container = %container,
                count = invalidated.len(),
                "invalidated unconfirmed children"
            );
        }
        invalidated
    }
}

/// Records the state each element had before a scan touched it, so an
/// aborted scan can be undone.
#[derive(Debug, Default)]
pub struct StateJournal {
    previous: HashMap<ElementId, ElementState>,
    swept: HashSet<ElementId>,
    /// File bindings replaced when a method was confirmed in the scanned file.
    rebound: HashMap<ElementId, BTreeSet<FileId>>,
    /// Containers the scanned file was newly added to.
    added_files: Vec<ElementId>,
}

impl StateJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first state seen for `id`.
    pub fn record(&mut self, id: ElementId, previous: ElementState) {
        self.previous.entry(id).or_insert(previous);
    }

    pub fn record_swept(&mut self, ids: &[ElementId]) {
        self.swept.extend(ids.iter().cloned());
    }

    /// Keeps the state and binding an existing element had before this scan
    /// confirmed it.
    pub fn record_confirmation(&mut self, id: &ElementId, prior: Prior) {
        self.record(id.clone(), prior.state);
        self.rebound.entry(id.clone()).or_insert(prior.files);
    }

    pub fn record_added_file(&mut self, id: ElementId) {
        self.added_files.push(id);
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    /// Restores journaled elements still carrying a state this scan produced,
    /// then the file bindings it changed for `file`. Compare-and-set keeps a
    /// concurrent scan's later transition intact.
    pub fn rollback(self, registry: &IdentityRegistry, file: &FileId) -> usize {
        let mut restored = 0;
        for (id, previous) in self.previous {
            let undone = registry.compare_and_set_state(&id, ElementState::Pending, previous)
                || (self.swept.contains(&id)
                    && registry.compare_and_set_state(&id, ElementState::Invalid, previous))
                || (previous == ElementState::Invalid
                    && registry.compare_and_set_state(
                        &id,
                        ElementState::Valid,
                        ElementState::Invalid,
                    ));
            if undone {
                trace!(id = %id, state = previous.as_str(), "restored element state");
                restored += 1;
            }
        }

        for (id, files) in self.rebound {
            if registry.restore_files(&id, file, files) {
                trace!(id = %id, "restored file binding");
            }
        }
        for id in self.added_files {
            registry.remove_file(&id, file);
        }
        restored
    }
}
