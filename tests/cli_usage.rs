use assert_cmd::Command;
use tempfile::TempDir;

fn operator(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("operator").expect("binary exists");
    cmd.current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_instruction_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = operator(&dir).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"));
}

#[test]
fn missing_plan_file_fails_before_any_browser_work() {
    let dir = TempDir::new().unwrap();
    operator(&dir)
        .args(["--plan-file", "absent.yml", "--config", "none.yaml"])
        .assert()
        .failure()
        .code(1);

    assert!(!dir.path().join("logs").exists());
    assert!(dir.path().join("operator.log").exists());
}

#[test]
fn malformed_plan_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("plan.yml"), "steps: 42\n").unwrap();

    operator(&dir)
        .args(["--plan-file", "plan.yml", "--config", "none.yaml"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn version_includes_build_stamp() {
    let dir = TempDir::new().unwrap();
    let output = operator(&dir).arg("--version").output().unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
