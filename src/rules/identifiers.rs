use super::RuleContext;
use crate::core::catalog::{kind_code, KindCode};
use crate::core::diagnostic::Diagnostic;

/// Duplicate identifiers across the project, one diagnostic per pair of
/// declarations. Each is reported on the later file (by path order) and
/// cites the earlier one.
pub fn check(ctx: &RuleContext) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for (id, records) in ctx.index.identity_groups() {
        let code = kind_code(id.kind, KindCode::Duplicate);
        for (i, earlier) in records.iter().enumerate() {
            for later in &records[i + 1..] {
                diags.push(Diagnostic::new(
                    &code,
                    &later.path,
                    None,
                    &[
                        ("id", id.canonical()),
                        ("other", earlier.path.display().to_string()),
                    ],
                ));
            }
        }
    }
    diags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{codes, Fixture};

    #[test]
    fn duplicate_cites_both_paths() {
        let f = Fixture::new(&[
            ("ADR-003_bus.md", "# ADR-03\n"),
            ("ADR-03_queue.md", "# ADR-03\n"),
            ("ADR-04_cache.md", "# ADR-04\n"),
        ]);
        let diags = check(&f.ctx(false));
        assert_eq!(codes(&diags), vec!["ADR-E001"]);
        assert_eq!(diags[0].path, f.path("ADR-03_queue.md"));
        assert!(diags[0].message.contains("ADR-003_bus.md"));
        assert!(diags[0].message.contains("ADR-03"));
    }

    #[test]
    fn three_declarations_give_three_pairs() {
        let f = Fixture::new(&[
            ("a/ADR-003_a.md", "# ADR-03\n"),
            ("b/ADR-003_b.md", "# ADR-03\n"),
            ("c/ADR-03_c.md", "# ADR-03\n"),
        ]);
        let diags = check(&f.ctx(false));
        assert_eq!(codes(&diags), vec!["ADR-E001"; 3]);
        let cited = |rel: &str, other: &str| {
            diags
                .iter()
                .any(|d| d.path == f.path(rel) && d.message.contains(other))
        };
        assert!(cited("b/ADR-003_b.md", "ADR-003_a.md"));
        assert!(cited("c/ADR-03_c.md", "ADR-003_a.md"));
        assert!(cited("c/ADR-03_c.md", "ADR-003_b.md"));
    }

    #[test]
    fn same_contract_in_two_formats_is_not_a_duplicate() {
        let f = Fixture::new(&[("CTR-001_api.md", "# CTR-001\n"), ("CTR-001_api.yaml", "title: api\n")]);
        assert!(check(&f.ctx(false)).is_empty());
    }
}
