//! Test methods a class inherits from base classes, in its own file or others.

use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use super::test_utils::*;
use xunit_explorer::element::{ElementId, ElementState, FileId, TypeName};
use xunit_explorer::registry::IdentityRegistry;

const ABSTRACT_BASE: &str = r#"
namespace N
{
    public abstract class BaseTests
    {
        [Fact]
        public void Shared() { }
    }

    public class DerivedTests : BaseTests
    {
    }
}
"#;

const BASE_FILE: &str =
    "namespace N { public abstract class BaseTests { [Fact] public void Shared() { } [Fact] public void Other() { } } }";

const DERIVED_FILE: &str =
    "namespace N { public class DerivedTests : BaseTests { [Fact] public void Own() { } } }";

#[test]
fn test_abstract_base_methods_surface_through_derived_class() {
    let registry = Arc::new(IdentityRegistry::new());
    let report = scan(&registry, "Tests.cs", ABSTRACT_BASE);

    assert_eq!(
        ids(&report),
        vec!["xunit:N.DerivedTests", "xunit:N.DerivedTests.BaseTests.Shared"]
    );
    assert!(!registry.contains(&ElementId::new("xunit:N.BaseTests")));
    assert_eq!(
        registry.children(&ElementId::new("xunit:N.DerivedTests")),
        vec![ElementId::new("xunit:N.DerivedTests.BaseTests.Shared")]
    );
}

#[test]
fn test_concrete_base_is_also_its_own_test_class() {
    let registry = Arc::new(IdentityRegistry::new());
    let source = ABSTRACT_BASE.replace("public abstract class", "public class");
    scan(&registry, "Tests.cs", &source);

    assert_eq!(
        registry.ids(),
        vec![
            ElementId::new("xunit:N.BaseTests"),
            ElementId::new("xunit:N.BaseTests.Shared"),
            ElementId::new("xunit:N.DerivedTests"),
            ElementId::new("xunit:N.DerivedTests.BaseTests.Shared"),
        ]
    );
}

#[test]
fn test_method_declared_on_derived_class_hides_base_method() {
    let registry = Arc::new(IdentityRegistry::new());
    let source = ABSTRACT_BASE.replace(
        "public class DerivedTests : BaseTests\n    {",
        "public class DerivedTests : BaseTests\n    {\n        [Fact]\n        public new void Shared() { }",
    );
    let report = scan(&registry, "Tests.cs", &source);

    assert_eq!(
        ids(&report),
        vec!["xunit:N.DerivedTests", "xunit:N.DerivedTests.Shared"]
    );
}

#[test]
fn test_base_class_in_another_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("BaseTests.cs"), BASE_FILE).unwrap();
    fs::write(temp_dir.path().join("DerivedTests.cs"), DERIVED_FILE).unwrap();

    let project = project(temp_dir.path());
    let scans = project.scan_all(|| false).unwrap();
    assert!(scans.iter().all(|scan| scan.outcome.is_ok()));

    let registry = project.registry();
    for id in [
        "xunit:N.DerivedTests.Own",
        "xunit:N.DerivedTests.BaseTests.Shared",
        "xunit:N.DerivedTests.BaseTests.Other",
    ] {
        assert_eq!(state(registry, id), Some(ElementState::Valid), "{id}");
    }
    assert!(registry.is_in_file(
        &ElementId::new("xunit:N.DerivedTests.BaseTests.Shared"),
        &FileId::new(temp_dir.path().join("DerivedTests.cs"))
    ));
}

#[test]
fn test_method_removed_from_base_is_invalidated_through_derived_class() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("BaseTests.cs");
    fs::write(&base, BASE_FILE).unwrap();
    fs::write(temp_dir.path().join("DerivedTests.cs"), DERIVED_FILE).unwrap();

    let project = project(temp_dir.path());
    project.scan_all(|| false).unwrap();

    fs::write(
        &base,
        "namespace N { public abstract class BaseTests { [Fact] public void Shared() { } } }",
    )
    .unwrap();
    project.scan_all(|| false).unwrap();

    let registry = project.registry();
    assert_eq!(
        state(registry, "xunit:N.DerivedTests.BaseTests.Other"),
        Some(ElementState::Invalid)
    );
    assert_eq!(
        state(registry, "xunit:N.DerivedTests.BaseTests.Shared"),
        Some(ElementState::Valid)
    );
    assert_eq!(state(registry, "xunit:N.DerivedTests.Own"), Some(ElementState::Valid));
}

#[test]
fn test_recorded_inherited_method_survives_unchanged_rescan() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("T.cs"), facts(&["A"])).unwrap();
    let project = project(temp_dir.path());
    project.scan_all(|| false).unwrap();

    let owner = ElementId::new("xunit:N.T");
    let container = project
        .record_inherited_method(&owner, &TypeName::new("N.SharedTests"), "Adds")
        .unwrap();

    let scans = project.scan_all(|| false).unwrap();
    assert!(scans
        .iter()
        .filter_map(|scan| scan.report())
        .all(|report| report.invalidated.is_empty()));

    assert_eq!(project.registry().state(&container), Some(ElementState::Valid));
    assert!(project.registry().children(&owner).contains(&container));
    assert_eq!(state(project.registry(), "xunit:N.T.A"), Some(ElementState::Valid));
}
