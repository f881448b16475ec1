use sddlint::core::config::Config;
use sddlint::core::engine::{self, CancelToken, RunOptions, RunOutcome};
use sddlint::rules::RuleFamily;
use std::fs;
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

fn tags(tmp: &TempDir, strict: bool) -> RunOutcome {
    let options = RunOptions {
        target: tmp.path().to_path_buf(),
        root: tmp.path().to_path_buf(),
        families: vec![RuleFamily::Tags],
        strict,
        ..RunOptions::default()
    };
    engine::run(&options, &Config::default(), &CancelToken::new()).expect("run")
}

fn summary(outcome: &RunOutcome) -> Vec<(&str, Option<usize>)> {
    outcome
        .diagnostics
        .iter()
        .map(|d| (d.code.as_str(), d.line))
        .collect()
}

#[test]
fn well_formed_chain_is_clean() {
    let tmp = tree(&[
        ("BRD-01_goals.md", "# BRD-01\n"),
        ("PRD-01_app.md", "# PRD-01\n\n@brd: BRD-01:03\n"),
        (
            "REQ-07_login.md",
            "# REQ-07\n\n@brd: BRD-01:03\n@prd: PRD-01.02, PRD-01:04\n@impl-status: in-progress\n",
        ),
    ]);
    let outcome = tags(&tmp, false);
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn vocabulary_and_shape_errors() {
    let tmp = tree(&[(
        "REQ-07_login.md",
        "# REQ-07\n\n@widget: BRD-01\n@prd: PRD-01\n@impl-status: finished\n@adr: PRD-02\n",
    )]);
    let outcome = tags(&tmp, false);
    assert_eq!(
        summary(&outcome),
        vec![
            ("TAG-E001", Some(3)),
            ("TAG-E002", Some(4)),
            ("TAG-E003", Some(5)),
            ("TAG-E004", Some(6)),
        ]
    );
    assert_eq!(outcome.exit_code, 2);
}

#[test]
fn unresolved_upstream_needs_an_indexed_kind() {
    let tmp = tree(&[
        ("PRD-01_app.md", "# PRD-01\n"),
        ("REQ-07_login.md", "# REQ-07\n\n@prd: PRD-09:01\n@ears: EARS-02:01\n"),
    ]);
    let outcome = tags(&tmp, false);
    assert_eq!(summary(&outcome), vec![("TAG-W001", Some(3))]);
}

#[test]
fn pending_tags_are_recorded_then_flagged_stale() {
    let tmp = tree(&[("REQ-07_login.md", "# REQ-07\n\n@spec: PENDING\n")]);
    let outcome = tags(&tmp, false);
    assert_eq!(summary(&outcome), vec![("TAG-I001", Some(3))]);
    assert_eq!(outcome.exit_code, 0);

    fs::write(tmp.path().join("SPEC-07.yaml"), "id: SPEC-07\n").expect("write spec");
    let outcome = tags(&tmp, false);
    assert_eq!(
        summary(&outcome),
        vec![("TAG-W002", Some(3)), ("TAG-I001", Some(3))]
    );
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(tags(&tmp, true).exit_code, 2);
}
