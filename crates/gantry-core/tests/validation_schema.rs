//! Tests for the schema rule (`syntax-check`): required keys and value
//! shapes, collected in a single pass.

use gantry_core::{Diagnostic, GantryEngine, Severity};

fn schema_diagnostics(yaml: &str) -> Vec<Diagnostic> {
    let engine = GantryEngine::new();
    engine
        .analyze(yaml)
        .diagnostics
        .into_iter()
        .filter(|d| d.rule == "syntax-check")
        .collect()
}

#[test]
fn job_missing_runs_on_is_exactly_one_diagnostic_at_job_key() {
    let yaml = r#"
on: push
jobs:
  build:
    steps:
      - run: echo hello
"#;

    let engine = GantryEngine::new();
    let result = engine.analyze(yaml);

    assert_eq!(result.diagnostics.len(), 1, "got: {:?}", result.diagnostics);
    let d = &result.diagnostics[0];
    assert_eq!(d.rule, "syntax-check");
    assert_eq!(d.severity, Severity::Error);
    // `build:` is on line 4 of the fixture (leading newline included).
    assert_eq!(d.line, 4);
    assert!(d.message.contains("runs-on"));
    assert!(d.message.contains("build"));
}

#[test]
fn job_with_uses_does_not_need_runs_on() {
    let yaml = r#"
on: push
jobs:
  call:
    uses: octo-org/ci/.github/workflows/build.yml@v2
"#;

    assert!(schema_diagnostics(yaml).is_empty());
}

#[test]
fn job_with_uses_cannot_define_steps() {
    let yaml = r#"
on: push
jobs:
  call:
    uses: octo-org/ci/.github/workflows/build.yml@v2
    steps:
      - run: echo nope
"#;

    let diagnostics = schema_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("reusable workflow"));
}

#[test]
fn missing_on_section_is_an_error() {
    let yaml = r#"
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: echo hello
"#;

    let diagnostics = schema_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("'on'"));
}

#[test]
fn empty_on_section_is_an_error() {
    let yaml = r#"
on:
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: echo hello
"#;

    let diagnostics = schema_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("empty"));
    assert_eq!(diagnostics[0].line, 2);
}

#[test]
fn empty_runs_on_is_an_error() {
    let yaml = r#"
on: push
jobs:
  build:
    runs-on: ""
    steps:
      - run: echo hello
"#;

    let diagnostics = schema_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("empty"));
}

#[test]
fn step_with_both_run_and_uses_is_an_error() {
    let yaml = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
        run: echo hello
"#;

    let diagnostics = schema_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("both"));
}

#[test]
fn step_with_neither_run_nor_uses_is_an_error() {
    let yaml = r#"
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - name: does nothing
"#;

    let diagnostics = schema_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("either"));
}

#[test]
fn unknown_top_level_key_is_a_warning() {
    let yaml = r#"
on: push
job:
  oops: true
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - run: echo hello
"#;

    let diagnostics = schema_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert!(diagnostics[0].message.contains("job"));
}

#[test]
fn all_violations_are_collected_in_one_pass() {
    let yaml = r#"
on: push
jobs:
  one:
    steps:
      - run: echo a
  two:
    runs-on: ubuntu-latest
    steps:
      - name: empty step
"#;

    let diagnostics = schema_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 2, "got: {:?}", diagnostics);
}

#[test]
fn missing_on_and_jobs_are_both_reported() {
    // Both diagnostics anchor to the document root; neither may be
    // collapsed away.
    let diagnostics = schema_diagnostics("name: demo\n");

    assert_eq!(diagnostics.len(), 2, "got: {:?}", diagnostics);
    assert!(diagnostics.iter().any(|d| d.message.contains("'on'")));
    assert!(diagnostics.iter().any(|d| d.message.contains("'jobs'")));
}

#[test]
fn empty_jobs_section_is_an_error() {
    let yaml = "on: push\njobs: {}\n";

    let diagnostics = schema_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("jobs"));
}
