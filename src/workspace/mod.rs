//! Drives scan sessions over a project directory.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ProjectContext;
use crate::discovery::{Declaration, ScanReport, ScanSession, TypeInfoProvider};
use crate::element::{ElementId, FileId, TypeName};
use crate::error::{IoError, RegistryError, Result};
use crate::parser::{is_source_file, CSharpParser};
use crate::registry::IdentityRegistry;

/// Build output and tool directories never hold test sources.
pub const EXCLUDED_DIRS: &[&str] = &["bin", "obj", "node_modules", "packages", "TestResults"];

/// Result of scanning one file during [`Project::scan_all`].
#[derive(Debug)]
pub struct FileScan {
    pub path: PathBuf,
    pub outcome: Result<ScanReport>,
}

impl FileScan {
    pub fn report(&self) -> Option<&ScanReport> {
        self.outcome.as_ref().ok()
    }
}

/// One test project: its context, type conventions and identity registry.
pub struct Project {
    context: ProjectContext,
    provider: Arc<dyn TypeInfoProvider>,
    registry: Arc<IdentityRegistry>,
}

impl Project {
    pub fn new(context: ProjectContext, provider: Arc<dyn TypeInfoProvider>) -> Self {
        Self {
            context,
            provider,
            registry: Arc::new(IdentityRegistry::new()),
        }
    }

    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    pub fn registry(&self) -> &Arc<IdentityRegistry> {
        &self.registry
    }

    /// C# sources under the project root, sorted. A root that is itself a
    /// source file yields just that file.
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        let root = &self.context.root;
        if root.is_file() {
            return Ok(if is_source_file(root) {
                vec![root.clone()]
            } else {
                Vec::new()
            });
        }
        if !root.is_dir() {
            return Err(IoError::directory_not_found(root).into());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !EXCLUDED_DIRS.contains(&name.as_ref())
        }) {
            let entry = entry.map_err(|e| IoError::walk_error(root, e))?;
            if entry.file_type().is_file() && is_source_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        debug!(root = %root.display(), count = files.len(), "found source files");
        Ok(files)
    }

    fn session(&self, file: &Path) -> Result<ScanSession> {
        Ok(ScanSession::builder()
            .registry(Arc::clone(&self.registry))
            .provider(Arc::clone(&self.provider))
            .file(file)
            .assembly_location(self.context.assembly_location.clone())
            .build()?)
    }

    /// Scans an already lowered declaration tree as the contents of `file`.
    pub fn scan_declarations<F>(
        &self,
        file: &Path,
        root: &Declaration,
        interrupted: F,
    ) -> Result<ScanReport>
    where
        F: Fn() -> bool,
    {
        Ok(self.session(file)?.scan(root, interrupted)?)
    }

    pub fn scan_file<F>(&self, path: &Path, interrupted: F) -> Result<ScanReport>
    where
        F: Fn() -> bool,
    {
        let root = parse(path)?;
        self.scan_declarations(path, &root, interrupted)
    }

    /// Scans every source file in parallel against the shared registry.
    ///
    /// All files are parsed and indexed before the first scan starts, so a
    /// class sees its partial declarations and base classes wherever they
    /// are declared.
    pub fn scan_all<F>(&self, interrupted: F) -> Result<Vec<FileScan>>
    where
        F: Fn() -> bool + Sync,
    {
        let files = self.source_files()?;
        let parsed: Vec<(PathBuf, Result<Declaration>)> = files
            .into_par_iter()
            .map(|path| {
                let root = parse(&path);
                (path, root)
            })
            .collect();

        parsed.par_iter().for_each(|(path, root)| {
            if let Ok(root) = root {
                self.provider
                    .index_declarations(&FileId::from(path.as_path()), root);
            }
        });

        let scans: Vec<FileScan> = parsed
            .into_par_iter()
            .map(|(path, root)| {
                let outcome =
                    root.and_then(|root| self.scan_declarations(&path, &root, &interrupted));
                if let Err(e) = &outcome {
                    if !e.is_cancelled() {
                        warn!(path = %path.display(), error = %e, "scan failed");
                    }
                }
                FileScan { path, outcome }
            })
            .collect();

        let dispositions: usize = scans
            .iter()
            .filter_map(FileScan::report)
            .map(ScanReport::disposition_count)
            .sum();
        info!(
            files = scans.len(),
            dispositions,
            elements = self.registry.len(),
            "project scanned"
        );
        Ok(scans)
    }

    /// Materialises a theory row reported by a test run under `method`.
    pub fn record_theory(&self, method: &ElementId, raw_name: &str) -> Result<ElementId> {
        Ok(self.registry.get_or_create_theory(method, raw_name)?)
    }

    /// Surfaces a base-class test method, reported by a test run, under the
    /// test class `owner` that inherits it. The container is never swept by
    /// later scans of the owner's files.
    pub fn record_inherited_method(
        &self,
        owner: &ElementId,
        declaring_type: &TypeName,
        method_name: &str,
    ) -> Result<ElementId> {
        let Some(class) = self.registry.get(owner) else {
            return Err(RegistryError::unknown_element(owner).into());
        };
        if class.as_class().is_none() {
            return Err(RegistryError::kind_mismatch(owner, "class", class.kind.name()).into());
        }

        let container = self
            .registry
            .get_or_create_inherited_container(declaring_type, method_name)?;
        self.registry.adopt(owner, &container)?;
        Ok(container)
    }
}

fn parse(path: &Path) -> Result<Declaration> {
    CSharpParser::new()?.parse_file(path)
}
