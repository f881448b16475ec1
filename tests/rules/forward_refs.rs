use sddlint::core::config::Config;
use sddlint::core::engine::{self, CancelToken, RunOptions, RunOutcome};
use sddlint::rules::RuleFamily;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().expect("tmpdir");
    for (rel, body) in files {
        let path = tmp.path().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, body).expect("write");
    }
    tmp
}

fn fwdref(target: &Path, search_dirs: &[&Path]) -> RunOutcome {
    let options = RunOptions {
        target: target.to_path_buf(),
        root: target.to_path_buf(),
        families: vec![RuleFamily::ForwardRefs],
        search_dirs: search_dirs.iter().map(|d| d.to_path_buf()).collect(),
        ..RunOptions::default()
    };
    engine::run(&options, &Config::default(), &CancelToken::new()).expect("run")
}

fn summary(outcome: &RunOutcome) -> Vec<(String, Option<usize>)> {
    outcome
        .diagnostics
        .iter()
        .map(|d| (d.code.clone(), d.line))
        .collect()
}

#[test]
fn downstream_references_across_layers() {
    let tmp = tree(&[
        (
            "01_BRD/BRD-01_goals.md",
            "# BRD-01\n\nRefined by PRD-01.\nPlatform scope lives in SYS-01.\nStorage is ADR-009.\n",
        ),
        ("02_PRD/PRD-01_app.md", "# PRD-01\n\nDerived from BRD-01.\n"),
        ("06_SYS/SYS-01_platform.md", "# SYS-01\n\nTraces to BRD-01 and PRD-01.\n"),
    ]);
    let outcome = fwdref(tmp.path(), &[]);
    assert_eq!(
        summary(&outcome),
        vec![
            ("FWDREF-E001".to_string(), Some(5)),
            ("FWDREF-W001".to_string(), Some(4)),
        ]
    );
    assert_eq!(outcome.exit_code, 2);
}

#[test]
fn width_variants_resolve_to_the_same_document() {
    let tmp = tree(&[
        ("BRD-01_goals.md", "# BRD-01\n\nSee PRD-0001 and PRD-001.\n"),
        ("PRD-01_app.md", "# PRD-01\n"),
    ]);
    assert!(fwdref(tmp.path(), &[]).diagnostics.is_empty());
}

#[test]
fn search_dirs_satisfy_downstream_targets() {
    let tmp = tree(&[
        ("docs/BRD-01_goals.md", "# BRD-01\n\nRefined in EARS-05.\n"),
        ("shared/EARS-05_store.md", "# EARS-05\n"),
    ]);
    let docs = tmp.path().join("docs");
    assert_eq!(fwdref(&docs, &[]).diagnostics.len(), 1);
    let outcome = fwdref(&docs, &[&tmp.path().join("shared")]);
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(outcome.files_checked, 1);
}

#[test]
fn search_dir_targets_still_obey_the_layer_span() {
    let tmp = tree(&[
        ("docs/BRD-01_goals.md", "# BRD-01\n\nDecided in ADR-05.\n"),
        ("shared/ADR-05_store.md", "# ADR-05\n"),
    ]);
    let outcome = fwdref(&tmp.path().join("docs"), &[&tmp.path().join("shared")]);
    assert_eq!(summary(&outcome), vec![("FWDREF-W001".to_string(), Some(3))]);
    assert_eq!(outcome.exit_code, 1);
}

#[test]
fn downstream_count_claims_warn() {
    let tmp = tree(&[(
        "PRD-01_app.md",
        "# PRD-01\n\nThis product will need 4 ADRs.\n\n```text\n2 REQs\n```\n",
    )]);
    let outcome = fwdref(tmp.path(), &[]);
    assert_eq!(summary(&outcome), vec![("FWDREF-W002".to_string(), Some(3))]);
    assert_eq!(outcome.exit_code, 1);
}
