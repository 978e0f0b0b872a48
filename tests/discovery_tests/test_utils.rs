use std::path::Path;
use std::sync::Arc;

use xunit_explorer::config::ProjectContext;
use xunit_explorer::discovery::{
    Declaration, ScanReport, ScanSession, TypeInfoProvider, XunitConventions,
};
use xunit_explorer::element::{ElementId, ElementState};
use xunit_explorer::parser::CSharpParser;
use xunit_explorer::registry::IdentityRegistry;
use xunit_explorer::Project;

pub fn parse(source: &str) -> Declaration {
    CSharpParser::new()
        .expect("C# grammar should load")
        .parse(source, Path::new("Test.cs"))
        .expect("source should parse")
}

pub fn session(registry: &Arc<IdentityRegistry>, file: &str) -> ScanSession {
    shared_session(registry, &Arc::new(XunitConventions::default()), file)
}

/// A session whose provider, and so its type index, outlives the scan.
pub fn shared_session(
    registry: &Arc<IdentityRegistry>,
    provider: &Arc<XunitConventions>,
    file: &str,
) -> ScanSession {
    ScanSession::builder()
        .registry(Arc::clone(registry))
        .provider(Arc::clone(provider) as Arc<dyn TypeInfoProvider>)
        .file(file)
        .assembly_location("bin/Calculator.Tests.dll")
        .build()
        .expect("session should build")
}

/// Scans `source` as the full contents of `file`.
pub fn scan(registry: &Arc<IdentityRegistry>, file: &str, source: &str) -> ScanReport {
    session(registry, file)
        .scan(&parse(source), || false)
        .expect("uninterrupted scan should succeed")
}

pub fn state(registry: &IdentityRegistry, id: &str) -> Option<ElementState> {
    registry.state(&ElementId::new(id))
}

pub fn ids(report: &ScanReport) -> Vec<String> {
    report.elements().map(ToString::to_string).collect()
}

/// States of every registered element, ordered by identity.
pub fn states(registry: &IdentityRegistry) -> Vec<(String, ElementState)> {
    registry
        .snapshot()
        .into_iter()
        .map(|element| (element.id.to_string(), element.state))
        .collect()
}

pub fn project(root: &Path) -> Project {
    Project::new(
        ProjectContext::for_root(root, None),
        Arc::new(XunitConventions::default()),
    )
}

/// C# source for class `N.T` with one fact per name and a trailing helper.
pub fn facts(names: &[&str]) -> String {
    let mut source = String::from("namespace N\n{\n    public class T\n    {\n");
    for name in names {
        source.push_str(&format!("        [Fact]\n        public void {name}() {{ }}\n\n"));
    }
    source.push_str("        private void Helper() { }\n    }\n}\n");
    source
}
