use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn garagebook(data: &Path) -> Command {
    let mut cmd = Command::cargo_bin("garagebook").unwrap();
    cmd.env("GARAGEBOOK_DATA", data)
        .env("NO_COLOR", "1")
        .env_remove("GARAGEBOOK_USER")
        .env_remove("GARAGEBOOK_PASSWORD");
    cmd
}

/// Runs the command and pulls the short id out of "... added (abcd1234): ...".
fn added_id(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    let start = stdout.find('(').expect("no id in output") + 1;
    let end = start + stdout[start..].find(')').expect("unterminated id");
    stdout[start..end].to_string()
}

#[test]
fn purchase_flow_updates_stock_and_report() {
    let temp_dir = tempfile::tempdir().unwrap();
    let data = temp_dir.path();

    let client = added_id(garagebook(data).args(["client", "add", "Ada Lovelace", "555-0100"]));
    let vehicle = added_id(garagebook(data).args(["vehicle", "add", &client, "Volvo", "240", "1988", "abc 123"]));
    let part = added_id(garagebook(data).args(["catalog", "add-part", "Oil filter", "12.50", "--stock", "5"]));
    let service = added_id(garagebook(data).args(["catalog", "add-service", "Oil change", "40"]));

    garagebook(data)
        .args(["purchase", "record", &client, "--vehicle", &vehicle])
        .args(["-s", &service, "-p", &format!("{}:2", part)])
        .args(["--date", "2026-10-19"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Purchase recorded"))
        .stdout(predicate::str::contains("65.00 for Ada Lovelace"));

    garagebook(data)
        .args(["expense", "add", "Rent", "30", "--category", "Premises", "--date", "2026-10-01"])
        .assert()
        .success();

    garagebook(data)
        .args(["catalog", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Oil filter"))
        .stdout(predicate::str::contains("x3"));

    garagebook(data)
        .args(["client", "show", &client])
        .assert()
        .success()
        .stdout(predicate::str::contains("1988 Volvo 240 (ABC 123)"))
        .stdout(predicate::str::contains("1 purchase(s), 65.00 spent"));

    garagebook(data)
        .args(["report", "2026-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Report for 2026-10"))
        .stdout(predicate::str::contains("65.00"))
        .stdout(predicate::str::contains("premises"))
        .stdout(predicate::str::contains("35.00"));

    assert!(data.join("expenses").join("2026-10.json").exists());
}

#[test]
fn selling_more_than_stock_fails_without_changes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let data = temp_dir.path();

    let client = added_id(garagebook(data).args(["client", "add", "Grace", "1"]));
    let part = added_id(garagebook(data).args(["catalog", "add-part", "Spark plug", "4", "--stock", "1"]));

    garagebook(data)
        .args(["purchase", "record", &client, "-p", &format!("{}:3", part)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Not enough stock for Spark plug"));

    garagebook(data)
        .args(["purchase", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No purchases found."));

    garagebook(data)
        .args(["catalog", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("x1"));
}

#[test]
fn unknown_ids_are_reported() {
    let temp_dir = tempfile::tempdir().unwrap();

    garagebook(temp_dir.path())
        .args(["client", "show", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: No client matches 'deadbeef'"));
}

#[test]
fn only_a_manager_adds_employees_once_staffed() {
    let temp_dir = tempfile::tempdir().unwrap();
    let data = temp_dir.path();

    garagebook(data)
        .args(["employee", "add", "Mo", "manager", "--new-password", "secret"])
        .assert()
        .success();

    garagebook(data)
        .args(["employee", "add", "Kim", "clerk", "--new-password", "hunter2"])
        .assert()
        .failure();

    garagebook(data)
        .args(["--user", "mo", "--password", "secret"])
        .args(["employee", "add", "Kim", "clerk", "--new-password", "hunter2"])
        .assert()
        .success();

    garagebook(data)
        .args(["--user", "Mo", "--password", "wrong", "employee", "list"])
        .assert()
        .failure();

    garagebook(data)
        .args(["employee", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kim"))
        .stdout(predicate::str::contains("manager"));
}

#[test]
fn config_changes_keep_records_readable() {
    let temp_dir = tempfile::tempdir().unwrap();
    let data = temp_dir.path();

    let client = added_id(garagebook(data).args(["client", "add", "Ada", "1"]));

    garagebook(data)
        .args(["config", "obfuscate", "on"])
        .assert()
        .success()
        .stdout(predicate::str::contains("obfuscate set to true"));

    let raw = std::fs::read_to_string(data.join("clients.json")).unwrap();
    assert!(!raw.trim_start().starts_with('{'));
    assert!(!raw.contains("\"name\""));

    garagebook(data)
        .args(["client", "show", &client])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada"));

    garagebook(data)
        .args(["config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("obfuscate = true"))
        .stdout(predicate::str::contains("date-format = %Y-%m-%d"));
}
