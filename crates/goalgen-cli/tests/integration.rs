use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn goalgen() -> Command {
    Command::cargo_bin("goalgen").unwrap()
}

const VALID_SPEC: &str = r#"{
  "id": "trip_planner",
  "title": "Trip Planner",
  "description": "Plans trips end to end",
  "version": "1.0.0",
  "agents": {
    "sup": {"kind": "supervisor", "policy": "simple_router"},
    "flights": {
      "kind": "llm_agent",
      "llm_config": {"model": "gpt-4o", "temperature": 0.2},
      "tools": ["search_flights"]
    }
  },
  "tools": {
    "search_flights": {
      "type": "http",
      "spec": {"url": "https://api.example.com/flights", "method": "GET"}
    }
  },
  "ux": {"webchat": {"enabled": true}},
  "deployment": {"environments": {"dev": {}, "prod": {}}}
}"#;

const INVALID_SPEC: &str = r#"{
  "id": "Trip Planner",
  "title": "Trip Planner",
  "version": "one",
  "agents": {"helper": {"kind": "llm_agent"}}
}"#;

fn write_spec(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// ---------------------------------------------------------------------------
// goalgen validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_valid_spec() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", VALID_SPEC);

    goalgen()
        .args(["validate", spec.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn validate_rejects_invalid_spec_with_diagnostics() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", INVALID_SPEC);

    goalgen()
        .args(["validate", spec.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[ERROR] root.id"))
        .stdout(predicate::str::contains("[ERROR] root.version"))
        .stdout(predicate::str::contains("supervisor"));
}

#[test]
fn validate_errors_only_hides_warnings_and_infos() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", INVALID_SPEC);

    goalgen()
        .args(["validate", spec.to_str().unwrap(), "--errors-only"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[WARNING]").not())
        .stdout(predicate::str::contains("[INFO]").not());
}

#[test]
fn validate_json_reports_counts_and_diagnostics() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", VALID_SPEC);

    let output = goalgen()
        .args(["validate", spec.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let results: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(results[0]["valid"], true);
    assert_eq!(results[0]["errors"], 0);
}

#[test]
fn validate_multiple_specs_fails_if_any_invalid() {
    let dir = TempDir::new().unwrap();
    let good = write_spec(&dir, "good.json", VALID_SPEC);
    let bad = write_spec(&dir, "bad.json", INVALID_SPEC);

    goalgen()
        .args(["validate", good.to_str().unwrap(), bad.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 2"));
}

#[test]
fn validate_missing_file_fails_cleanly() {
    goalgen()
        .args(["validate", "/nonexistent/goal.json"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// goalgen generate
// ---------------------------------------------------------------------------

#[test]
fn generate_writes_files_and_manifest() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", VALID_SPEC);
    let out = dir.path().join("out");

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated"));

    assert!(out.join("README.md").exists());
    assert!(out.join("orchestrator/app.py").exists());
    assert!(out.join("workflow/agents/flights.py").exists());
    assert!(out.join("tools/search_flights.py").exists());
    assert!(out.join("infra/parameters.dev.json").exists());
    assert!(out.join(".goalgen/manifest.json").exists());
    // lock released after the run
    assert!(!out.join(".goalgen/lock").exists());
}

#[test]
fn generate_refuses_invalid_spec_and_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", INVALID_SPEC);
    let out = dir.path().join("out");

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation failed"));

    assert!(!out.exists());
}

#[test]
fn generate_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", VALID_SPEC);
    let out = dir.path().join("out");

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!out.join("README.md").exists());
    assert!(!out.join(".goalgen/manifest.json").exists());
}

#[test]
fn generate_incremental_preserves_user_edit() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", VALID_SPEC);
    let out = dir.path().join("out");

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let readme = out.join("README.md");
    std::fs::write(&readme, "my own notes\n").unwrap();

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--incremental",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("preserved"));

    assert_eq!(std::fs::read_to_string(&readme).unwrap(), "my own notes\n");
}

#[test]
fn generate_force_overwrites_user_edit() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", VALID_SPEC);
    let out = dir.path().join("out");

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let readme = out.join("README.md");
    std::fs::write(&readme, "my own notes\n").unwrap();

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--incremental",
            "--force",
        ])
        .assert()
        .success();

    assert_ne!(std::fs::read_to_string(&readme).unwrap(), "my own notes\n");
}

#[test]
fn generate_target_subset_only_runs_named_targets() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", VALID_SPEC);
    let out = dir.path().join("out");

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--targets",
            "scaffold,infra",
        ])
        .assert()
        .success();

    assert!(out.join("README.md").exists());
    assert!(out.join("infra/main.bicep").exists());
    assert!(!out.join("orchestrator/app.py").exists());
}

#[test]
fn generate_rejects_unknown_target() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", VALID_SPEC);

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            dir.path().join("out").to_str().unwrap(),
            "--targets",
            "scaffold,bogus",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"));
}

#[test]
fn generate_fails_when_output_dir_is_locked() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(&dir, "goal.json", VALID_SPEC);
    let out = dir.path().join("out");
    std::fs::create_dir_all(out.join(".goalgen")).unwrap();
    std::fs::write(out.join(".goalgen/lock"), "pid 0\n").unwrap();

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("in progress"));
}

#[test]
fn generate_yaml_spec_is_accepted() {
    let dir = TempDir::new().unwrap();
    let spec = write_spec(
        &dir,
        "goal.yaml",
        concat!(
            "id: trip_planner\n",
            "title: Trip Planner\n",
            "version: 1.0.0\n",
            "agents:\n",
            "  sup:\n",
            "    kind: supervisor\n",
        ),
    );
    let out = dir.path().join("out");

    goalgen()
        .args([
            "generate",
            "--spec",
            spec.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--targets",
            "scaffold",
        ])
        .assert()
        .success();
    assert!(out.join("README.md").exists());
}
