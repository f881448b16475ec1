use sddlint::core::config::Config;
use sddlint::core::engine::{self, CancelToken, RunOptions, RunOutcome};
use sddlint::rules::RuleFamily;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A split PRD-001 with an index declaring `declared` and the given sections.
fn split_doc(declared: &str, sections: &[u32]) -> TempDir {
    let tmp = TempDir::new().expect("tmpdir");
    let dir = tmp.path().join("02_PRD");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(
        dir.join("PRD-001.0_index.md"),
        format!("---\ntitle: Checkout\n{declared}---\n# PRD-01: Checkout\n"),
    )
    .expect("write index");
    for n in sections {
        fs::write(dir.join(format!("PRD-001.{n}_part.md")), format!("# Part {n}\n"))
            .expect("write section");
    }
    tmp
}

fn sections(target: &Path, auto_fix: bool) -> RunOutcome {
    let options = RunOptions {
        target: target.to_path_buf(),
        root: target.to_path_buf(),
        families: vec![RuleFamily::Sections],
        auto_fix,
        ..RunOptions::default()
    };
    engine::run(&options, &Config::default(), &CancelToken::new()).expect("run")
}

fn codes(outcome: &RunOutcome) -> Vec<&str> {
    outcome.diagnostics.iter().map(|d| d.code.as_str()).collect()
}

#[test]
fn single_index_file_sees_its_siblings() {
    let tmp = split_doc("total_sections: 10\n", &[1, 2, 3, 4, 5, 6, 7, 8]);
    let index = tmp.path().join("02_PRD/PRD-001.0_index.md");
    let outcome = sections(&index, false);
    assert_eq!(codes(&outcome), vec!["SEC-E001"]);
    assert_eq!(outcome.diagnostics[0].line, Some(3));
    assert!(outcome.diagnostics[0].message.contains("declares 10 but 8"));
    assert_eq!(outcome.files_checked, 1);
}

#[test]
fn auto_fix_is_idempotent() {
    let tmp = split_doc("total_sections: \"10\"\n", &[1, 2, 3]);
    let first = sections(tmp.path(), true);
    assert_eq!(codes(&first), vec!["SEC-I001"]);
    assert_eq!(first.fixes_applied, 1);
    assert_eq!(first.exit_code, 0);

    let index = tmp.path().join("02_PRD/PRD-001.0_index.md");
    let fixed = fs::read_to_string(&index).expect("read");
    assert!(fixed.contains("total_sections: \"3\"\n"));

    let second = sections(tmp.path(), true);
    assert!(second.diagnostics.is_empty());
    assert_eq!(second.fixes_applied, 0);
    assert_eq!(fs::read_to_string(&index).expect("read"), fixed);
}

#[test]
fn gaps_and_missing_totals() {
    let tmp = split_doc("total_sections: 3\n", &[1, 3, 4]);
    let outcome = sections(tmp.path(), false);
    assert_eq!(codes(&outcome), vec!["SEC-W001"]);
    assert_eq!(outcome.exit_code, 1);

    let tmp = split_doc("", &[1, 2]);
    assert_eq!(codes(&sections(tmp.path(), false)), vec!["SEC-E002"]);
}

#[test]
fn sections_without_an_index() {
    let tmp = TempDir::new().expect("tmpdir");
    for n in [1, 2] {
        fs::write(tmp.path().join(format!("ADR-04.{n}_part.md")), "# part\n").expect("write");
    }
    let outcome = sections(tmp.path(), false);
    assert_eq!(codes(&outcome), vec!["SEC-E003"]);
    assert!(outcome.diagnostics[0].path.ends_with("ADR-04.1_part.md"));
}
