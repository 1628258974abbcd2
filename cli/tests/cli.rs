use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn adpilot(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("adpilot").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("MISTRAL_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("ADPILOT_PROTOCOL")
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env("HOME", dir.path());
    cmd
}

#[test]
fn tools_lists_the_advertising_catalog() {
    let dir = TempDir::new().unwrap();
    adpilot(&dir)
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("get_campaign_metrics"))
        .stdout(predicate::str::contains("get_search_terms"))
        .stdout(predicate::str::contains("date_range"));
}

#[test]
fn check_runs_offline() {
    let dir = TempDir::new().unwrap();
    adpilot(&dir)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("850.0"))
        .stdout(predicate::str::contains("Self-check passed"));
}

#[test]
fn question_without_configuration_fails() {
    let dir = TempDir::new().unwrap();
    adpilot(&dir)
        .arg("What happened to CPA last month?")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No configuration found"));
}

#[test]
fn invalid_agent_settings_are_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("adpilot.json"),
        r#"{"protocol": "mistral", "api_key": "k", "agent": {"max_iterations": 0}}"#,
    )
    .unwrap();

    adpilot(&dir)
        .arg("How are my campaigns doing?")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid agent settings"));
}
