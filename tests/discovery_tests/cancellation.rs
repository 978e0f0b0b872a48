//! Interrupted scans deliver nothing and leave every state as it was.

use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use super::test_utils::*;
use xunit_explorer::element::{ElementId, ElementState, FileId};
use xunit_explorer::error::ScanError;
use xunit_explorer::registry::IdentityRegistry;

/// Fires on poll number `n` and every poll after it.
fn after_polls(n: usize) -> impl Fn() -> bool {
    let polls = Cell::new(0);
    move || {
        polls.set(polls.get() + 1);
        polls.get() >= n
    }
}

#[test]
fn test_cancelled_scan_restores_every_state() {
    let registry = Arc::new(IdentityRegistry::new());
    scan(&registry, "T.cs", &facts(&["A", "B", "C"]));
    let before = states(&registry);

    // Removing B would invalidate it; cancel before the class is exited.
    let tree = parse(&facts(&["A", "C"]));
    for cancel_at in 1..=5 {
        let result = session(&registry, "T.cs").scan(&tree, after_polls(cancel_at));
        assert!(matches!(result, Err(ScanError::Cancelled { .. })), "poll {cancel_at}");
        assert_eq!(states(&registry), before, "poll {cancel_at}");
    }
}

#[test]
fn test_cancelled_scan_delivers_no_dispositions() {
    let registry = Arc::new(IdentityRegistry::new());
    let mut delivered = 0;

    let result = session(&registry, "T.cs").scan_with(
        &parse(&facts(&["A", "B"])),
        after_polls(5),
        |_| delivered += 1,
    );

    assert!(result.is_err());
    assert_eq!(delivered, 0);
}

#[test]
fn test_cancelled_revival_returns_to_invalid() {
    let registry = Arc::new(IdentityRegistry::new());
    scan(&registry, "T.cs", &facts(&["A", "B"]));
    scan(&registry, "T.cs", &facts(&["A"]));
    assert_eq!(state(&registry, "xunit:N.T.B"), Some(ElementState::Invalid));

    // root, namespace, class, A, B (revived), then cancel on the helper.
    let result = session(&registry, "T.cs").scan(&parse(&facts(&["A", "B"])), after_polls(6));

    assert!(result.is_err());
    assert_eq!(state(&registry, "xunit:N.T.B"), Some(ElementState::Invalid));
    assert_eq!(state(&registry, "xunit:N.T.A"), Some(ElementState::Valid));
}

#[test]
fn test_cancelled_scan_leaves_moved_method_in_its_old_file() {
    let registry = Arc::new(IdentityRegistry::new());
    scan(&registry, "X.cs", &facts(&["K", "M"]));
    scan(&registry, "X.cs", &facts(&["K"]));
    let m = ElementId::new("xunit:N.T.M");
    let (x, y) = (FileId::new("X.cs"), FileId::new("Y.cs"));
    assert_eq!(registry.state(&m), Some(ElementState::Invalid));
    assert!(registry.is_in_file(&m, &x));

    // root, namespace, class, M (confirmed in Y.cs), then cancel on the helper.
    let result = session(&registry, "Y.cs").scan(&parse(&facts(&["M"])), after_polls(5));

    assert!(result.is_err());
    assert_eq!(registry.state(&m), Some(ElementState::Invalid));
    assert!(registry.is_in_file(&m, &x));
    assert!(!registry.is_in_file(&m, &y));

    let class = registry.get(&ElementId::new("xunit:N.T")).unwrap();
    assert!(!class.files.contains(&y));

    // The same move, uninterrupted, does take effect.
    scan(&registry, "Y.cs", &facts(&["M"]));
    assert_eq!(registry.state(&m), Some(ElementState::Valid));
    assert!(registry.is_in_file(&m, &y));
    assert!(!registry.is_in_file(&m, &x));
}

#[test]
fn test_elements_created_before_cancel_are_kept() {
    let registry = Arc::new(IdentityRegistry::new());

    let result = session(&registry, "T.cs").scan(&parse(&facts(&["A", "B"])), after_polls(5));

    assert!(result.is_err());
    assert_eq!(state(&registry, "xunit:N.T.A"), Some(ElementState::Valid));
    assert_eq!(state(&registry, "xunit:N.T.B"), None);
}

#[test]
fn test_rescan_after_cancel_matches_uninterrupted_scan() {
    let interrupted = Arc::new(IdentityRegistry::new());
    let clean = Arc::new(IdentityRegistry::new());
    for registry in [&interrupted, &clean] {
        scan(registry, "T.cs", &facts(&["A", "B", "C"]));
    }

    let edited = facts(&["A", "D"]);
    let _ = session(&interrupted, "T.cs").scan(&parse(&edited), after_polls(5));
    let resumed = scan(&interrupted, "T.cs", &edited);
    let expected = scan(&clean, "T.cs", &edited);

    assert_eq!(resumed.dispositions, expected.dispositions);
    assert_eq!(states(&interrupted), states(&clean));
}

#[test]
fn test_project_reports_cancellation() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("T.cs");
    fs::write(&path, facts(&["A"])).unwrap();

    let err = project(temp_dir.path()).scan_file(&path, || true).unwrap_err();
    assert!(err.is_cancelled());
}
