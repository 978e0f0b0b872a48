//! Whole fixture projects scanned through [`Project`].

use pretty_assertions::assert_eq;
use std::sync::Arc;

use super::test_utils::*;
use crate::fixtures::get_test_fixture_path;
use xunit_explorer::config::{Conventions, ProjectContext};
use xunit_explorer::element::{ElementId, ElementState, FileId};
use xunit_explorer::{Project, XunitConventions};

const CALCULATOR_IDS: &[&str] = &[
    "xunit:Calculator.Tests.CalculatorTests",
    "xunit:Calculator.Tests.CalculatorTests+Nested",
    "xunit:Calculator.Tests.CalculatorTests+Nested.Runs",
    "xunit:Calculator.Tests.CalculatorTests.Adds",
    "xunit:Calculator.Tests.CalculatorTests.AddsMany",
    "xunit:Calculator.Tests.CalculatorTests.DividesByZero",
    "xunit:Calculator.Tests.GenericTests`1",
    "xunit:Calculator.Tests.Vectors.VectorTests",
    "xunit:Calculator.Tests.Vectors.VectorTests.Adds",
    "xunit:Calculator.Tests.Vectors.VectorTests.Scales",
];

fn calculator() -> Project {
    project(&get_test_fixture_path("csharp", Some("calculator")))
}

fn registered_ids(project: &Project) -> Vec<String> {
    project
        .registry()
        .ids()
        .into_iter()
        .map(|id| id.to_string())
        .collect()
}

#[test]
fn test_calculator_fixture_registers_expected_elements() {
    let project = calculator();
    let scans = project.scan_all(|| false).unwrap();

    assert!(scans.iter().all(|scan| scan.outcome.is_ok()));
    assert_eq!(registered_ids(&project), CALCULATOR_IDS);
    assert!(states(project.registry())
        .iter()
        .all(|(_, state)| *state == ElementState::Valid));
}

#[test]
fn test_build_output_is_not_scanned() {
    let project = calculator();
    let files = project.source_files().unwrap();

    assert_eq!(files.len(), 3);
    assert!(files
        .iter()
        .all(|path| !path.components().any(|c| c.as_os_str() == "obj")));
}

#[test]
fn test_traits_and_skip_reason_are_recorded() {
    let project = calculator();
    project.scan_all(|| false).unwrap();
    let registry = project.registry();

    let many = registry
        .get(&ElementId::new("xunit:Calculator.Tests.CalculatorTests.AddsMany"))
        .unwrap();
    assert_eq!(many.as_method().unwrap().categories, vec!["Math", "Owner[alice]"]);

    let skipped = registry
        .get(&ElementId::new(
            "xunit:Calculator.Tests.CalculatorTests.DividesByZero",
        ))
        .unwrap();
    assert_eq!(
        skipped.as_method().unwrap().skip_reason.as_deref(),
        Some("Division by zero is not handled yet")
    );

    let scales = registry
        .get(&ElementId::new("xunit:Calculator.Tests.Vectors.VectorTests.Scales"))
        .unwrap();
    assert_eq!(scales.as_method().unwrap().categories, vec!["Slow"]);
}

#[test]
fn test_partial_class_is_bound_to_every_file() {
    let root = get_test_fixture_path("csharp", Some("calculator"));
    let project = project(&root);
    project.scan_all(|| false).unwrap();

    let class = project
        .registry()
        .get(&ElementId::new("xunit:Calculator.Tests.Vectors.VectorTests"))
        .unwrap();
    let add = FileId::new(root.join("Vectors").join("VectorTests.Add.cs"));
    let scale = FileId::new(root.join("Vectors").join("VectorTests.Scale.cs"));

    assert!(class.is_in_file(&add));
    assert!(class.is_in_file(&scale));
    assert!(project.registry().is_in_file(
        &ElementId::new("xunit:Calculator.Tests.Vectors.VectorTests.Scales"),
        &scale
    ));
    assert!(!project.registry().is_in_file(
        &ElementId::new("xunit:Calculator.Tests.Vectors.VectorTests.Scales"),
        &add
    ));
}

#[test]
fn test_repeated_passes_are_stable() {
    let project = calculator();
    project.scan_all(|| false).unwrap();
    let first = states(project.registry());

    for _ in 0..3 {
        let scans = project.scan_all(|| false).unwrap();
        assert!(scans
            .iter()
            .filter_map(|scan| scan.report())
            .all(|report| report.invalidated.is_empty()));
    }

    assert_eq!(states(project.registry()), first);
}

#[test]
fn test_two_projects_agree_on_identities() {
    let left = calculator();
    let right = calculator();
    left.scan_all(|| false).unwrap();
    right.scan_all(|| false).unwrap();

    assert_eq!(registered_ids(&left), registered_ids(&right));
}

#[test]
fn test_yaml_conventions_recognise_custom_fact_attribute() {
    let path = get_test_fixture_path("csharp", Some("conventions.yaml"));
    let conventions = Conventions::load(&path).unwrap();
    assert_eq!(conventions.fact_attributes, vec!["Fact", "SkippableFact"]);
    assert_eq!(conventions.theory_attributes, vec!["Theory"]);

    let temp_dir = tempfile::TempDir::new().unwrap();
    let file = temp_dir.path().join("FlakyTests.cs");
    std::fs::write(
        &file,
        "namespace N { public class FlakyTests { [SkippableFact] public void Retries() { } } }",
    )
    .unwrap();

    let project = Project::new(
        ProjectContext::for_root(temp_dir.path(), None),
        Arc::new(XunitConventions::new(conventions)),
    );
    project.scan_all(|| false).unwrap();

    assert_eq!(
        state(project.registry(), "xunit:N.FlakyTests.Retries"),
        Some(ElementState::Valid)
    );
}
