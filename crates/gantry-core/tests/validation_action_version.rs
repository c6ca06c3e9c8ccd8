//! Tests for the action-version rule: `uses:` reference format and
//! version pinning.

use gantry_core::{Diagnostic, GantryEngine, Severity};

fn version_diagnostics(yaml: &str) -> Vec<Diagnostic> {
    let engine = GantryEngine::new();
    engine
        .analyze(yaml)
        .diagnostics
        .into_iter()
        .filter(|d| d.rule == "action-version")
        .collect()
}

fn workflow_with_uses(uses: &str) -> String {
    format!(
        "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: {}\n",
        uses
    )
}

#[test]
fn branch_pin_is_exactly_one_diagnostic() {
    let diagnostics = version_diagnostics(&workflow_with_uses("actions/checkout@main"));

    assert_eq!(diagnostics.len(), 1, "got: {:?}", diagnostics);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert!(diagnostics[0].message.contains("mutable"));
    assert!(diagnostics[0].message.contains("main"));
}

#[test]
fn full_commit_sha_pin_is_clean() {
    let diagnostics = version_diagnostics(&workflow_with_uses(
        "actions/checkout@8f4b7f84864484a7bf31766abe9204da3cbe65b1",
    ));

    assert!(diagnostics.is_empty(), "got: {:?}", diagnostics);
}

#[test]
fn short_sha_pin_is_flagged() {
    // A short hash is ambiguous and can be repointed; only the
    // full-length form counts as immutable.
    let diagnostics = version_diagnostics(&workflow_with_uses("actions/checkout@8f4b7f8"));
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn version_tag_pin_is_clean() {
    assert!(version_diagnostics(&workflow_with_uses("actions/checkout@v4")).is_empty());
    assert!(version_diagnostics(&workflow_with_uses("actions/checkout@v4.2.2")).is_empty());
    assert!(version_diagnostics(&workflow_with_uses("docker/build-push-action@2.10.0")).is_empty());
}

#[test]
fn missing_ref_is_an_error() {
    let diagnostics = version_diagnostics(&workflow_with_uses("actions/checkout"));

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert!(diagnostics[0].message.contains("@ref"));
}

#[test]
fn local_and_docker_references_are_exempt() {
    assert!(version_diagnostics(&workflow_with_uses("./.github/actions/build")).is_empty());
    assert!(version_diagnostics(&workflow_with_uses("docker://alpine:3.19")).is_empty());
}

#[test]
fn missing_owner_is_an_error() {
    let diagnostics = version_diagnostics(&workflow_with_uses("checkout@v4"));

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("owner/repo"));
}

#[test]
fn reusable_workflow_reference_is_checked() {
    let yaml = r#"
on: push
jobs:
  call:
    uses: octo-org/ci/.github/workflows/build.yml@master
"#;

    let diagnostics = version_diagnostics(yaml);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("master"));
}

#[test]
fn dynamic_reference_is_skipped() {
    let diagnostics =
        version_diagnostics(&workflow_with_uses("${{ matrix.action }}@${{ matrix.version }}"));
    assert!(diagnostics.is_empty(), "got: {:?}", diagnostics);
}
