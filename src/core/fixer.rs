//! Auto-fix applicator.
//!
//! Rules only propose [`Fix`] payloads. Once every rule has run, fixes are
//! grouped per file and applied under an exclusive advisory lock. Each fix
//! touches exactly one line; a line that already carries the replacement
//! counts as fixed, so applying twice changes nothing.

use crate::core::diagnostic::Fix;
use crate::core::error::SddError;
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStatus {
    Applied,
    AlreadyApplied,
    /// The line no longer holds the text the rule saw.
    Stale,
}

/// Apply fixes, returning a status per input fix in input order.
pub fn apply(fixes: &[Fix]) -> Result<Vec<FixStatus>, SddError> {
    let mut by_file: BTreeMap<&PathBuf, Vec<usize>> = BTreeMap::new();
    for (pos, fix) in fixes.iter().enumerate() {
        by_file.entry(&fix.path).or_default().push(pos);
    }

    let mut statuses = vec![FixStatus::Stale; fixes.len()];
    for (path, positions) in by_file {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        FileExt::lock_exclusive(&file)?;

        let mut content = String::new();
        file.read_to_string(&mut content)?;
        let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();

        let mut changed = false;
        for pos in positions {
            let fix = &fixes[pos];
            let Some(line) = fix.line.checked_sub(1).and_then(|i| lines.get_mut(i)) else {
                continue;
            };
            statuses[pos] = if line.contains(&fix.find) {
                *line = line.replacen(&fix.find, &fix.replace, 1);
                changed = true;
                FixStatus::Applied
            } else if line.contains(&fix.replace) {
                FixStatus::AlreadyApplied
            } else {
                FixStatus::Stale
            };
        }

        if changed {
            let rewritten = lines.concat();
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(rewritten.as_bytes())?;
            file.flush()?;
            info!(path = %path.display(), "applied fixes");
        } else {
            debug!(path = %path.display(), "no fix changed the file");
        }
        FileExt::unlock(&file)?;
    }
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fix(path: &PathBuf, line: usize, find: &str, replace: &str) -> Fix {
        Fix {
            path: path.clone(),
            line,
            find: find.to_string(),
            replace: replace.to_string(),
        }
    }

    #[test]
    fn applies_once_and_is_idempotent() {
        let tmp = TempDir::new().expect("tmpdir");
        let path = tmp.path().join("PRD-01.0_index.md");
        fs::write(&path, "---\ntotal_sections: 10\n---\nbody\r\n").expect("write");

        let fixes = vec![fix(&path, 2, "total_sections: 10", "total_sections: 8")];
        assert_eq!(apply(&fixes).expect("apply"), vec![FixStatus::Applied]);
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "---\ntotal_sections: 8\n---\nbody\r\n"
        );
        assert_eq!(apply(&fixes).expect("apply"), vec![FixStatus::AlreadyApplied]);
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "---\ntotal_sections: 8\n---\nbody\r\n"
        );
    }

    #[test]
    fn stale_and_out_of_range_fixes_leave_file_alone() {
        let tmp = TempDir::new().expect("tmpdir");
        let path = tmp.path().join("a.md");
        fs::write(&path, "one\ntwo\n").expect("write");
        let fixes = vec![fix(&path, 1, "zzz", "yyy"), fix(&path, 9, "one", "1")];
        assert_eq!(
            apply(&fixes).expect("apply"),
            vec![FixStatus::Stale, FixStatus::Stale]
        );
        assert_eq!(fs::read_to_string(&path).expect("read"), "one\ntwo\n");
    }
}
