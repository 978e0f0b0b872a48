//! Scans of different files running in parallel against one registry.

use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

use super::test_utils::*;
use xunit_explorer::discovery::{TypeInfoProvider, XunitConventions};
use xunit_explorer::element::{ElementId, ElementState, FileId, TypeName};
use xunit_explorer::registry::IdentityRegistry;

const THREADS: usize = 8;

fn partial_file(index: usize) -> String {
    format!(
        "namespace N {{ public partial class Shared {{ [Fact] public void Test{index}() {{ }} }} }}"
    )
}

#[test]
fn test_parallel_partial_scans_share_one_class() {
    let registry = Arc::new(IdentityRegistry::new());

    thread::scope(|scope| {
        for index in 0..THREADS {
            let registry = &registry;
            scope.spawn(move || {
                scan(registry, &format!("Shared.{index}.cs"), &partial_file(index));
            });
        }
    });

    let class = ElementId::new("xunit:N.Shared");
    assert_eq!(registry.len(), THREADS + 1);
    assert_eq!(registry.children(&class).len(), THREADS);
    assert!(registry
        .snapshot()
        .iter()
        .all(|element| element.state == ElementState::Valid));
    assert_eq!(registry.get(&class).unwrap().files.len(), THREADS);
}

#[test]
fn test_parallel_rescans_only_sweep_their_own_file() {
    let registry = Arc::new(IdentityRegistry::new());
    for index in 0..THREADS {
        scan(&registry, &format!("Shared.{index}.cs"), &partial_file(index));
    }

    // Every even file drops its test; odd files rescan unchanged.
    thread::scope(|scope| {
        for index in 0..THREADS {
            let registry = &registry;
            scope.spawn(move || {
                let source = if index % 2 == 0 {
                    "namespace N { public partial class Shared { [Fact] public void Keep() { } } }".to_string()
                } else {
                    partial_file(index)
                };
                scan(registry, &format!("Shared.{index}.cs"), &source);
            });
        }
    });

    for index in 0..THREADS {
        let expected = if index % 2 == 0 {
            ElementState::Invalid
        } else {
            ElementState::Valid
        };
        assert_eq!(
            state(&registry, &format!("xunit:N.Shared.Test{index}")),
            Some(expected),
            "Test{index}"
        );
    }
    assert_eq!(state(&registry, "xunit:N.Shared.Keep"), Some(ElementState::Valid));
}

#[test]
fn test_racing_get_or_create_yields_one_identity() {
    let registry = Arc::new(IdentityRegistry::new());
    let type_name = TypeName::new("N.Raced");

    let ids: Vec<ElementId> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    registry
                        .get_or_create_class(&type_name, std::path::Path::new("bin/N.dll"))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<&ElementId> = ids.iter().collect();
    assert_eq!(unique.len(), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_scan_all_matches_sequential_scans() {
    let temp_dir = TempDir::new().unwrap();
    for index in 0..THREADS {
        fs::write(
            temp_dir.path().join(format!("Shared.{index}.cs")),
            partial_file(index),
        )
        .unwrap();
    }

    let parallel = project(temp_dir.path());
    let scans = parallel.scan_all(|| false).unwrap();
    assert!(scans.iter().all(|scan| scan.outcome.is_ok()));

    let sequential = project(temp_dir.path());
    for path in sequential.source_files().unwrap() {
        sequential.scan_file(&path, || false).unwrap();
    }

    assert_eq!(states(parallel.registry()), states(sequential.registry()));
    assert_eq!(parallel.registry().ids(), sequential.registry().ids());
}

#[test]
fn test_parallel_scans_of_derived_classes_share_one_base_class() {
    let provider = Arc::new(XunitConventions::default());
    let base = "namespace N { public class BaseTests { [Fact] public void Shared() { } } }";
    provider.index_declarations(&FileId::new("BaseTests.cs"), &parse(base));

    for _ in 0..4 {
        let registry = Arc::new(IdentityRegistry::new());
        thread::scope(|scope| {
            for file in ["A.cs", "B.cs", "BaseTests.cs"] {
                let (registry, provider) = (&registry, &provider);
                scope.spawn(move || {
                    let source = match file {
                        "A.cs" => "namespace N { public class ATests : BaseTests { } }".to_string(),
                        "B.cs" => "namespace N { public class BTests : BaseTests { } }".to_string(),
                        _ => base.to_string(),
                    };
                    shared_session(registry, provider, file)
                        .scan(&parse(&source), || false)
                        .unwrap();
                });
            }
        });

        let base_classes = registry
            .snapshot()
            .into_iter()
            .filter(|element| element.id.as_str() == "xunit:N.BaseTests")
            .filter(|element| element.as_class().is_some())
            .count();
        assert_eq!(base_classes, 1);
        assert_eq!(
            registry.ids(),
            vec![
                ElementId::new("xunit:N.ATests"),
                ElementId::new("xunit:N.ATests.BaseTests.Shared"),
                ElementId::new("xunit:N.BTests"),
                ElementId::new("xunit:N.BTests.BaseTests.Shared"),
                ElementId::new("xunit:N.BaseTests"),
                ElementId::new("xunit:N.BaseTests.Shared"),
            ]
        );
        assert!(registry
            .snapshot()
            .iter()
            .all(|element| element.state == ElementState::Valid));
    }
}

#[test]
fn test_scan_all_discovers_inherited_tests_in_every_derived_class() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("BaseTests.cs"),
        "namespace N { public abstract class BaseTests { [Fact] public void Shared() { } } }",
    )
    .unwrap();
    for index in 0..THREADS {
        fs::write(
            temp_dir.path().join(format!("Derived{index}.cs")),
            format!("namespace N {{ public class Derived{index}Tests : BaseTests {{ }} }}"),
        )
        .unwrap();
    }

    let project = project(temp_dir.path());
    project.scan_all(|| false).unwrap();

    let registry = project.registry();
    assert_eq!(registry.len(), 2 * THREADS);
    for index in 0..THREADS {
        assert_eq!(
            state(registry, &format!("xunit:N.Derived{index}Tests.BaseTests.Shared")),
            Some(ElementState::Valid),
            "Derived{index}"
        );
    }
}
