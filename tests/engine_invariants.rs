use sddlint::core::config::Config;
use sddlint::core::engine::{self, CancelToken, RunOptions, RunOutcome};
use sddlint::core::ids::{self, Classification};
use sddlint::core::index::references_of;
use sddlint::core::loader;
use sddlint::core::report;
use sddlint::rules::RuleFamily;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PROJECT: &[(&str, &str)] = &[
    (
        "01_BRD/BRD-01_goals.md",
        "---\ntitle: Goals\n---\n# BRD-01: Goals\n\nThe business has 3 goals:\n\n- grow\n- retain\n- comply\n\nDelivery is tracked in PRD-01 and ADR-004.\n",
    ),
    (
        "02_PRD/PRD-01_app.md",
        "---\ntitle: App\n---\n# PRD-01: App\n\n@brd: BRD-01:02\n\nThe team uses a whitelist. Requests time out after 30 seconds.\n",
    ),
    ("05_ADR/ADR-003_bus.md", "# ADR-03: Bus\n\n@prd: PRD-01:01\n"),
    ("05_ADR/ADR-03_queue.md", "# ADR-03: Queue\n"),
    ("05_ADR/ADR-03_topic.md", "# ADR-03: Topic\n"),
    (
        "07_REQ/REQ-07_login.md",
        "---\ntitle: Login\n---\n# REQ-07\n\n@spec: PENDING\n\nNumber follow-ups starting at `001`.\n\nWe track two risks:\n- a\n- b\n- c\n",
    ),
    ("10_SPEC/SPEC-07.yaml", "id: SPEC-07\ntitle: Login spec\n"),
    ("notes.md", "# not an artifact\n"),
];

fn project() -> TempDir {
    let tmp = TempDir::new().expect("tmpdir");
    for (rel, body) in PROJECT {
        let path = tmp.path().join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, body).expect("write");
    }
    tmp
}

fn run(target: &Path, families: &[RuleFamily], auto_fix: bool) -> RunOutcome {
    let options = RunOptions {
        target: target.to_path_buf(),
        root: target.to_path_buf(),
        families: families.to_vec(),
        auto_fix,
        ..RunOptions::default()
    };
    engine::run(&options, &Config::default(), &CancelToken::new()).expect("run")
}

#[test]
fn loaded_records_carry_their_classified_identity() {
    let tmp = project();
    for path in loader::discover(tmp.path(), false) {
        let class = ids::classify(&path);
        let Classification::Artifact { id, format, .. } = class.clone() else {
            panic!("{} discovered but not an artifact", path.display());
        };
        let record = loader::load(&path, &class, false)
            .artifact
            .expect("record");
        assert_eq!(record.id, id);
        assert_eq!(record.format, format);
        assert_eq!(record.kind(), id.kind);
    }
}

#[test]
fn every_missing_downstream_reference_is_reported() {
    let tmp = project();
    let outcome = run(tmp.path(), &[RuleFamily::ForwardRefs], false);
    let records: Vec<_> = loader::discover(tmp.path(), false)
        .filter_map(|p| loader::load(&p, &ids::classify(&p), false).artifact)
        .collect();
    let existing: Vec<_> = records.iter().map(|r| r.id.as_document()).collect();

    let mut expected = 0;
    for record in &records {
        for reference in references_of(record) {
            let downstream = reference.target.layer() > record.layer();
            if downstream && !existing.contains(&reference.target.as_document()) {
                expected += 1;
                assert!(
                    outcome.diagnostics.iter().any(|d| d.code == "FWDREF-E001"
                        && d.path == record.path
                        && d.line == Some(reference.line)),
                    "no FWDREF-E001 for {} at {}:{}",
                    reference.target,
                    record.path.display(),
                    reference.line
                );
            }
        }
    }
    assert_eq!(expected, 1);
}

#[test]
fn one_duplicate_diagnostic_per_pair_of_declarations() {
    let tmp = project();
    let outcome = run(tmp.path(), &[RuleFamily::Ids], false);
    let duplicates: Vec<(String, &str)> = outcome
        .diagnostics
        .iter()
        .filter(|d| d.code == "ADR-E001")
        .map(|d| {
            let name = d.path.file_name().expect("name").to_string_lossy().into_owned();
            (name, d.message.as_str())
        })
        .collect();
    assert_eq!(duplicates.len(), 3);
    let cites = |on: &str, other: &str| {
        duplicates
            .iter()
            .any(|(name, message)| name == on && message.contains(other))
    };
    assert!(cites("ADR-03_queue.md", "ADR-003_bus.md"));
    assert!(cites("ADR-03_topic.md", "ADR-003_bus.md"));
    assert!(cites("ADR-03_topic.md", "ADR-03_queue.md"));
    assert!(duplicates.iter().all(|(name, _)| name != "ADR-003_bus.md"));
}

#[test]
fn reports_are_byte_identical_across_runs() {
    let tmp = project();
    let first = run(tmp.path(), &[], false);
    let second = run(tmp.path(), &[], false);
    assert!(!first.diagnostics.is_empty());
    assert_eq!(
        report::json(&first.diagnostics).expect("json"),
        report::json(&second.diagnostics).expect("json")
    );
    assert_eq!(report::text(&first, false), report::text(&second, false));
    assert_eq!(report::markdown(&first), report::markdown(&second));
}

#[test]
fn diagnostics_are_sorted_by_severity_then_location() {
    let tmp = project();
    let outcome = run(tmp.path(), &[], false);
    for pair in outcome.diagnostics.windows(2) {
        assert!(pair[0].sort_key() <= pair[1].sort_key());
    }
}

#[test]
fn auto_fix_twice_equals_auto_fix_once() {
    let tmp = project();
    let families = [RuleFamily::Counts, RuleFamily::Numbering, RuleFamily::Sections];
    let first = run(tmp.path(), &families, true);
    assert_eq!(first.fixes_applied, 2);
    let snapshot: Vec<String> = PROJECT
        .iter()
        .map(|(rel, _)| fs::read_to_string(tmp.path().join(rel)).expect("read"))
        .collect();

    let second = run(tmp.path(), &families, true);
    assert_eq!(second.fixes_applied, 0);
    let after: Vec<String> = PROJECT
        .iter()
        .map(|(rel, _)| fs::read_to_string(tmp.path().join(rel)).expect("read"))
        .collect();
    assert_eq!(snapshot, after);
    assert!(
        second
            .diagnostics
            .iter()
            .all(|d| !d.code.starts_with("COUNT-E") && !d.code.starts_with("NUM-W"))
    );
    let req = fs::read_to_string(tmp.path().join("07_REQ/REQ-07_login.md")).expect("read");
    assert!(req.contains("We track 3 risks:"));
    assert!(req.contains("starting at `01`"));
}
