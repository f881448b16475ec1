use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sddlint::core::config::Config;
use sddlint::core::engine::{self, CancelToken, RunOptions};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// A layered tree with `per_layer` documents of each of four kinds, each
/// referencing its upstream neighbours.
fn generate_tree(root: &Path, per_layer: usize) {
    let layers = [("01_BRD", "BRD"), ("02_PRD", "PRD"), ("05_ADR", "ADR"), ("07_REQ", "REQ")];
    for (pos, (dir, prefix)) in layers.iter().enumerate() {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        for n in 1..=per_layer {
            let mut body = format!(
                "---\ntitle: {prefix} {n}\ntags: [{prefix}]\n---\n# {prefix}-{n:02}: Document {n}\n\n## 1. Scope\n\nThe scope has 3 goals:\n\n- one\n- two\n- three\n\n"
            );
            if pos > 0 {
                let (_, upstream) = layers[pos - 1];
                body.push_str(&format!(
                    "@{}: {upstream}-{n:02}:01\n\nRequests time out after 30 seconds.\n",
                    upstream.to_ascii_lowercase()
                ));
            }
            fs::write(dir.join(format!("{prefix}-{n:02}_doc.md")), body).unwrap();
        }
    }
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_run");
    group.measurement_time(Duration::from_secs(10));

    for per_layer in [10usize, 50, 200] {
        let tmp = TempDir::new().unwrap();
        generate_tree(tmp.path(), per_layer);
        let options = RunOptions {
            target: tmp.path().to_path_buf(),
            root: tmp.path().to_path_buf(),
            ..RunOptions::default()
        };
        let config = Config::default();
        group.bench_with_input(
            BenchmarkId::new("all_families", per_layer * 4),
            &options,
            |b, options| {
                b.iter(|| {
                    let outcome = engine::run(options, &config, &CancelToken::new()).unwrap();
                    black_box(outcome.diagnostics.len());
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_full_run);
criterion_main!(benches);
