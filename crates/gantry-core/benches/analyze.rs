use criterion::{criterion_group, criterion_main, Criterion};
use gantry_core::{GantryEngine, YamlParser};
use std::fmt::Write as _;

/// Build a workflow large enough to make parse and rule costs visible.
fn large_workflow() -> String {
    let mut yaml = String::from("name: bench\non:\n  push:\n  pull_request:\njobs:\n");
    for job in 0..50 {
        let _ = write!(
            yaml,
            "  job-{job}:\n    runs-on: ubuntu-latest\n    steps:\n"
        );
        for step in 0..10 {
            let _ = write!(
                yaml,
                "      - name: step {step}\n        run: echo \"${{{{ github.run_id }}}} {step}\"\n"
            );
        }
    }
    yaml
}

fn parse_large_workflow(c: &mut Criterion) {
    let input = large_workflow();

    c.bench_function("parse_large_workflow", |b| {
        let mut parser = YamlParser::new();
        b.iter(|| {
            parser.load(&input).expect("parse failed");
        })
    });
}

fn analyze_large_workflow(c: &mut Criterion) {
    let input = large_workflow();
    let engine = GantryEngine::new();

    c.bench_function("analyze_large_workflow", |b| {
        b.iter(|| {
            let result = engine.analyze(&input);
            assert!(result.is_ok());
        })
    });
}

criterion_group!(benches, parse_large_workflow, analyze_large_workflow);
criterion_main!(benches);
