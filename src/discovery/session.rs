//! One traversal of one file's declaration tree.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};

use super::declaration::{ClassDeclaration, Declaration, MethodDeclaration};
use super::detector::{TestClassDetector, TestMethodDetector, TouchedClasses};
use super::provider::TypeInfoProvider;
use super::reconciler::{StateJournal, StateReconciler};
use crate::element::{Disposition, ElementId, FileId, Span, TypeName};
use crate::error::{ScanError, SessionError};
use crate::registry::IdentityRegistry;

/// Outcome of a completed scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub file: FileId,
    pub dispositions: Vec<Disposition>,
    pub classes: usize,
    pub invalidated: Vec<ElementId>,
}

impl ScanReport {
    pub fn disposition_count(&self) -> usize {
        self.dispositions.len()
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementId> {
        self.dispositions.iter().map(|d| &d.element)
    }
}

pub struct ScanSession {
    registry: Arc<IdentityRegistry>,
    provider: Arc<dyn TypeInfoProvider>,
    file: FileId,
    assembly_location: PathBuf,
}

impl ScanSession {
    pub fn builder() -> ScanSessionBuilder {
        ScanSessionBuilder::new()
    }

    pub fn file(&self) -> &FileId {
        &self.file
    }

    pub fn registry(&self) -> &Arc<IdentityRegistry> {
        &self.registry
    }

    /// Walks `root` in document order.
    ///
    /// The provider indexes `root` first, so inherited test methods resolve
    /// against the current text. `interrupted` is polled before every node. When it fires the scan
    /// aborts with [`ScanError::Cancelled`], no dispositions are produced and
    /// every state change made by this scan is rolled back.
    pub fn scan<F>(&self, root: &Declaration, interrupted: F) -> Result<ScanReport, ScanError>
    where
        F: Fn() -> bool,
    {
        self.scan_with(root, interrupted, |_| {})
    }

    /// Like [`scan`](Self::scan), handing each disposition to `consumer`
    /// once the walk has completed.
    pub fn scan_with<F, C>(
        &self,
        root: &Declaration,
        interrupted: F,
        mut consumer: C,
    ) -> Result<ScanReport, ScanError>
    where
        F: Fn() -> bool,
        C: FnMut(&Disposition),
    {
        trace!(file = %self.file, "scanning declarations");
        self.provider.index_declarations(&self.file, root);

        let mut walk = Walk::new(self, &interrupted, root);
        if let Err(err) = walk.visit(root) {
            let restored = walk.journal.rollback(&self.registry, &self.file);
            debug!(file = %self.file, restored, "scan cancelled");
            return Err(err);
        }

        for disposition in &walk.dispositions {
            consumer(disposition);
        }

        debug!(
            file = %self.file,
            classes = walk.touched.len(),
            dispositions = walk.dispositions.len(),
            invalidated = walk.invalidated.len(),
            "scan complete"
        );

        Ok(ScanReport {
            file: self.file.clone(),
            classes: walk.touched.len(),
            dispositions: walk.dispositions,
            invalidated: walk.invalidated,
        })
    }
}

/// Builds a [`ScanSession`]; the file, provider and registry are required.
#[derive(Default)]
pub struct ScanSessionBuilder {
    registry: Option<Arc<IdentityRegistry>>,
    provider: Option<Arc<dyn TypeInfoProvider>>,
    file: Option<FileId>,
    assembly_location: PathBuf,
}

impl ScanSessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(mut self, registry: Arc<IdentityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn TypeInfoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn file(mut self, file: impl Into<FileId>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn assembly_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.assembly_location = location.into();
        self
    }

    pub fn build(self) -> Result<ScanSession, SessionError> {
        Ok(ScanSession {
            file: self.file.ok_or(SessionError::MissingFile)?,
            provider: self.provider.ok_or(SessionError::MissingProvider)?,
            registry: self.registry.ok_or(SessionError::MissingRegistry)?,
            assembly_location: self.assembly_location,
        })
    }
}

/// Per-scan traversal state.
struct Walk<'s, F> {
    session: &'s ScanSession,
    interrupted: &'s F,
    class_detector: TestClassDetector<'s>,
    method_detector: TestMethodDetector<'s>,
    reconciler: StateReconciler<'s>,
    touched: TouchedClasses,
    /// Types whose inherited test methods were already confirmed.
    inherited: HashSet<TypeName>,
    /// Declarations of each type not yet exited; the sweep waits for the last one.
    open_declarations: HashMap<TypeName, usize>,
    journal: StateJournal,
    dispositions: Vec<Disposition>,
    invalidated: Vec<ElementId>,
}

impl<'s, F> Walk<'s, F>
where
    F: Fn() -> bool,
{
    fn new(session: &'s ScanSession, interrupted: &'s F, root: &Declaration) -> Self {
        let registry = session.registry.as_ref();
        let provider = session.provider.as_ref();

        let mut open_declarations = HashMap::new();
        for class in root.classes() {
            *open_declarations.entry(class.type_name.clone()).or_insert(0) += 1;
        }

        Self {
            session,
            interrupted,
            class_detector: TestClassDetector::new(
                registry,
                provider,
                &session.file,
                &session.assembly_location,
            ),
            method_detector: TestMethodDetector::new(registry, provider, &session.file),
            reconciler: StateReconciler::new(registry, &session.file),
            touched: TouchedClasses::new(),
            inherited: HashSet::new(),
            open_declarations,
            journal: StateJournal::new(),
            dispositions: Vec::new(),
            invalidated: Vec::new(),
        }
    }

    fn visit(&mut self, node: &Declaration) -> Result<(), ScanError> {
        if (self.interrupted)() {
            return Err(ScanError::cancelled(self.session.file.clone()));
        }

        match node {
            Declaration::Class(class) => {
                self.enter_class(class);
                for member in &class.members {
                    self.visit(member)?;
                }
                self.exit_class(class);
            }
            Declaration::Method(method) => self.enter_method(method),
            Declaration::Other(other) => {
                for child in &other.children {
                    self.visit(child)?;
                }
            }
        }
        Ok(())
    }

    fn enter_class(&mut self, class: &ClassDeclaration) {
        let Some(element) = self
            .class_detector
            .detect(class, &mut self.touched, &mut self.journal)
        else {
            return;
        };

        // Partial declarations accumulate files.
        if self.session.registry.add_file(&element, &self.session.file) {
            self.journal.record_added_file(element.clone());
        }
        self.emit(element, class.name_span, class.span);

        if self.inherited.insert(class.type_name.clone()) {
            self.enter_inherited(class);
        }
    }

    /// Inherited methods have no declaration in this file; they are reported
    /// at the deriving class.
    fn enter_inherited(&mut self, class: &ClassDeclaration) {
        for method in self.session.provider.inherited_test_methods(class) {
            let Some(element) = self.method_detector.detect_inherited(
                &class.type_name,
                &method,
                &self.touched,
                &mut self.journal,
            ) else {
                continue;
            };
            self.emit(element, class.name_span, class.span);
        }
    }

    fn enter_method(&mut self, method: &MethodDeclaration) {
        let Some(element) = self
            .method_detector
            .detect(method, &self.touched, &mut self.journal)
        else {
            return;
        };

        self.emit(element, method.name_span, method.span);
    }

    fn exit_class(&mut self, class: &ClassDeclaration) {
        let remaining = self
            .open_declarations
            .get_mut(&class.type_name)
            .map(|count| {
                *count = count.saturating_sub(1);
                *count
            })
            .unwrap_or(0);
        if remaining > 0 {
            return;
        }

        let Some(touched) = self.touched.get(&class.type_name) else {
            return;
        };
        let swept = self.reconciler.sweep(&touched.element);
        self.journal.record_swept(&swept);
        self.invalidated.extend(swept);
    }

    /// Declarations without a usable name or body location are not reported.
    fn emit(&mut self, element: ElementId, name_span: Option<Span>, span: Option<Span>) {
        let (Some(name_span), Some(span)) = (name_span, span) else {
            return;
        };
        if !name_span.is_valid() || !span.is_valid() {
            return;
        }

        self.dispositions.push(Disposition {
            element,
            file: self.session.file.clone(),
            name_span,
            span,
        });
    }
}
