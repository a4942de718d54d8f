//! Integration tests for the card-ledger CLI.
//!
//! These tests run the actual binary against a temporary data file and
//! verify output and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Run the binary with the given args against the given data file.
fn ledger_cmd(data_file: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("card-ledger").unwrap();
    cmd.env("CARD_LEDGER_FILE", data_file).args(args);
    cmd
}

/// Run a command expected to succeed and return its stdout.
fn run_ok(data_file: &Path, args: &[&str]) -> String {
    let assert = ledger_cmd(data_file, args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Extract the card id from `add` output: "... (<id>)".
fn added_card_id(output: &str) -> String {
    let start = output.rfind('(').unwrap() + 1;
    let end = output.rfind(')').unwrap();
    output[start..end].to_string()
}

#[test]
fn test_add_and_list_gift_card() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let output = run_ok(&data, &["add", "111", "Cafe", "50"]);
    assert!(output.contains("Gift card 'Cafe' added with balance €50.00"));

    let list = run_ok(&data, &["list"]);
    assert!(list.contains("#111"));
    assert!(list.contains("Cafe"));
    assert!(list.contains("€50.00"));
}

#[test]
fn test_add_fidelity_card_without_balance() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let output = run_ok(&data, &["add", "222", "Loyalty"]);
    assert!(output.contains("Fidelity card 'Loyalty' added"));

    let list = run_ok(&data, &["list"]);
    assert!(list.contains("[fidelity]"));
}

#[test]
fn test_duplicate_number_fails() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    run_ok(&data, &["add", "111", "Cafe", "50"]);
    ledger_cmd(&data, &["add", "111", "Other", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_spend_and_show_history() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let id = added_card_id(&run_ok(&data, &["add", "111", "Cafe", "50"]));

    let output = run_ok(&data, &["spend", &id, "20", "Coffee"]);
    assert!(output.contains("balance now €30.00"));

    let show = run_ok(&data, &["show", &id]);
    assert!(show.contains("Balance: €30.00 (initial €50.00)"));
    assert!(show.contains("Initial balance"));
    assert!(show.contains("Coffee"));
}

#[test]
fn test_spend_exceeding_balance_fails_and_preserves_state() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let id = added_card_id(&run_ok(&data, &["add", "111", "Cafe", "50"]));
    run_ok(&data, &["spend", &id, "20"]);

    ledger_cmd(&data, &["spend", &id, "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds the current balance"));

    let show = run_ok(&data, &["show", &id]);
    assert!(show.contains("Balance: €30.00"));
}

#[test]
fn test_spend_on_fidelity_card_fails() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let id = added_card_id(&run_ok(&data, &["add", "222", "Loyalty"]));
    ledger_cmd(&data, &["spend", &id, "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fidelity card"));
}

#[test]
fn test_reset_balance() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let id = added_card_id(&run_ok(&data, &["add", "111", "Cafe", "50"]));
    run_ok(&data, &["spend", &id, "20"]);

    let output = run_ok(&data, &["reset", &id, "50"]);
    assert!(output.contains("Balance reset to €50.00"));

    ledger_cmd(&data, &["reset", &id, "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn test_archive_hides_from_list() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let id = added_card_id(&run_ok(&data, &["add", "111", "Cafe", "50"]));
    run_ok(&data, &["archive", &id]);

    let list = run_ok(&data, &["list"]);
    assert!(list.contains("No active cards"));

    let archived = run_ok(&data, &["list", "--archived"]);
    assert!(archived.contains("Cafe"));

    run_ok(&data, &["unarchive", &id]);
    assert!(run_ok(&data, &["list"]).contains("Cafe"));
}

#[test]
fn test_delete_card() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let id = added_card_id(&run_ok(&data, &["add", "111", "Cafe", "50"]));
    run_ok(&data, &["delete", &id]);

    ledger_cmd(&data, &["show", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No card with id"));
}

#[test]
fn test_move_reorders_list() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let a = added_card_id(&run_ok(&data, &["add", "1", "First"]));
    run_ok(&data, &["add", "2", "Second"]);
    let c = added_card_id(&run_ok(&data, &["add", "3", "Third"]));

    run_ok(&data, &["move", &c, &a]);

    let list = run_ok(&data, &["list"]);
    let third_pos = list.find("Third").unwrap();
    let first_pos = list.find("First").unwrap();
    assert!(third_pos < first_pos);
}

#[test]
fn test_export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");
    let backup = dir.path().join("backup.json");
    let backup_arg = backup.to_str().unwrap();

    let id = added_card_id(&run_ok(&data, &["add", "111", "Cafe", "50"]));
    run_ok(&data, &["spend", &id, "20", "Coffee"]);
    run_ok(&data, &["add", "222", "Loyalty"]);

    let output = run_ok(&data, &["export", backup_arg]);
    assert!(output.contains("Exported 2 cards"));

    let exported = std::fs::read_to_string(&backup).unwrap();
    assert!(exported.contains("\"version\": \"1.0\""));
    assert!(exported.contains("\"exportDate\""));

    // import into a fresh data file
    let fresh = dir.path().join("fresh.json");
    let preview = run_ok(&fresh, &["import", backup_arg]);
    assert!(preview.contains("replace the 0 stored cards with the 2 cards"));
    assert!(run_ok(&fresh, &["list"]).contains("No active cards"));

    let confirmed = run_ok(&fresh, &["import", backup_arg, "--yes"]);
    assert!(confirmed.contains("Imported 2 cards (replaced 0)"));

    let list = run_ok(&fresh, &["list"]);
    assert!(list.contains("Cafe"));
    assert!(list.contains("€30.00"));
    assert!(list.contains("[fidelity]"));
}

#[test]
fn test_import_rejects_malformed_document() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");
    let bad = dir.path().join("bad.json");

    run_ok(&data, &["add", "111", "Keep", "5"]);

    std::fs::write(&bad, r#"{"cards":[{"id":"1","number":"2"}]}"#).unwrap();
    ledger_cmd(&data, &["import", bad.to_str().unwrap(), "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'name'"));

    // collection untouched
    assert!(run_ok(&data, &["list"]).contains("Keep"));
}

#[test]
fn test_set_barcode_format() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");

    let id = added_card_id(&run_ok(&data, &["add", "111", "Cafe", "50"]));
    run_ok(&data, &["format", &id, "EAN13"]);
    assert!(run_ok(&data, &["show", &id]).contains("Barcode: EAN13"));

    ledger_cmd(&data, &["format", &id, "QR"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown barcode format"));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("card-ledger").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing argument"));
}

#[test]
fn test_unknown_command_error() {
    let dir = TempDir::new().unwrap();
    ledger_cmd(&dir.path().join("cards.json"), &["frobnicate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown command"));
}

#[test]
fn test_corrupt_data_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("cards.json");
    std::fs::write(&data, "{definitely not json").unwrap();

    let list = run_ok(&data, &["list"]);
    assert!(list.contains("No active cards"));
}
