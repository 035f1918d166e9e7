use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn hooks_run_on_a_fresh_project_replicates_with_no_remote_configured() {
    let project = tempfile::tempdir().unwrap();
    Command::cargo_bin("codaph")
        .unwrap()
        .args(["hooks", "run", "post-commit", "--cwd", project.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("replicated history"));
}

#[test]
fn hooks_run_json_emits_parseable_summary() {
    let project = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("codaph")
        .unwrap()
        .args(["hooks", "run", "post-commit", "--json", "--cwd", project.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["skipped"], false);
}

#[test]
fn hooks_install_writes_managed_block() {
    let dir = tempfile::tempdir().unwrap();
    let hook_path = dir.path().join("post-commit");
    Command::cargo_bin("codaph")
        .unwrap()
        .args(["hooks", "install", "post-commit", "--path", hook_path.to_str().unwrap()])
        .assert()
        .success();
    let text = std::fs::read_to_string(&hook_path).unwrap();
    assert!(text.contains("codaph sync"));
}
