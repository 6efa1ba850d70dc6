use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn ledger_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ledgerline"))
}

fn init(temp_dir: &TempDir) -> String {
    let config_path = temp_dir.path().join("ledger-config");
    ledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
    config_path.to_str().unwrap().to_string()
}

fn write_state(config_path: &str, state: &str) {
    fs::write(Path::new(config_path).join("state.toml"), state).unwrap();
}

const TWO_INVOICES: &str = r#"[counter]
last_number = 2
last_year = 2026

[[invoices]]
id = "INV-2026-0001"
client = "example-client"
date = "2026-01-10"
due_date = "2099-02-09"
amount = 200.0
status = "PENDING"

[[invoices]]
id = "INV-2026-0002"
client = "example-client"
date = "2026-01-11"
due_date = "2020-02-10"
amount = 1250.0
status = "PENDING"
"#;

#[test]
fn test_help() {
    ledger_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Invoice payment reconciliation and status tracking",
        ));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    assert!(Path::new(&config_path).join("config.toml").exists());
    assert!(Path::new(&config_path).join("clients.toml").exists());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    ledger_cmd()
        .args(["-C", &config_path, "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    ledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_add_and_list() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    ledger_cmd()
        .args([
            "-C",
            &config_path,
            "add",
            "--client",
            "example-client",
            "--amount",
            "1250",
            "--date",
            "2099-01-10",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded INV-2099-0001"))
        .stdout(predicate::str::contains("Due:    2099-02-09"));

    ledger_cmd()
        .args(["-C", &config_path, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PENDING"))
        .stdout(predicate::str::contains("(=) OUTSTANDING"))
        .stdout(predicate::str::contains("$1,250.00"));
}

#[test]
fn test_add_unknown_client() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);

    ledger_cmd()
        .args(["-C", &config_path, "add", "--client", "nobody", "--amount", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Client 'nobody' not found"));
}

#[test]
fn test_partial_then_full_payment() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    write_state(&config_path, TWO_INVOICES);

    ledger_cmd()
        .args(["-C", &config_path, "pay", "INV-2026-0001", "80", "--partial"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$120.00 remaining"));

    ledger_cmd()
        .args(["-C", &config_path, "list", "--status", "partial"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-2026-0001"))
        .stdout(predicate::str::contains("PARTIAL"));

    ledger_cmd()
        .args(["-C", &config_path, "pay", "INV-2026-0001", "119.9999"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fully paid"));

    ledger_cmd()
        .args(["-C", &config_path, "payments", "INV-2026-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$80.00"))
        .stdout(predicate::str::contains("$120.00"))
        .stdout(predicate::str::contains("Status: PAID"));

    ledger_cmd()
        .args(["-C", &config_path, "pay", "INV-2026-0001", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already paid"));
}

#[test]
fn test_overpayment_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    write_state(&config_path, TWO_INVOICES);

    ledger_cmd()
        .args(["-C", &config_path, "pay", "INV-2026-0001", "200.01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max 200.00 outstanding"));
}

#[test]
fn test_cash_payment_by_index() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    write_state(&config_path, TWO_INVOICES);

    // Index 2 is the oldest invoice (list shows newest first)
    ledger_cmd()
        .args([
            "-C",
            &config_path,
            "pay",
            "2",
            "200",
            "--method",
            "cash",
            "--received",
            "150",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("short by 50.00"));

    ledger_cmd()
        .args([
            "-C",
            &config_path,
            "settle",
            "2",
            "--method",
            "cash",
            "--received",
            "250",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("fully paid"))
        .stdout(predicate::str::contains("Change due: $50.00"));
}

#[test]
fn test_pending_view() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    write_state(&config_path, TWO_INVOICES);

    ledger_cmd()
        .args(["-C", &config_path, "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OVERDUE"))
        .stdout(predicate::str::contains("INV-2026-0002"))
        .stdout(predicate::str::contains("Outstanding: $1,450.00 ($1,250.00 overdue)"));

    ledger_cmd()
        .args(["-C", &config_path, "settle", "INV-2026-0002"])
        .assert()
        .success();

    ledger_cmd()
        .args(["-C", &config_path, "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("INV-2026-0002").not())
        .stdout(predicate::str::contains("Outstanding: $200.00"));
}

#[test]
fn test_cancel() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    write_state(&config_path, TWO_INVOICES);

    ledger_cmd()
        .args(["-C", &config_path, "pay", "INV-2026-0002", "10"])
        .assert()
        .success();

    ledger_cmd()
        .args(["-C", &config_path, "cancel", "INV-2026-0002"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be cancelled"));

    ledger_cmd()
        .args(["-C", &config_path, "cancel", "INV-2026-0001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled INV-2026-0001"));

    ledger_cmd()
        .args(["-C", &config_path, "pay", "INV-2026-0001", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is cancelled"));
}

#[test]
fn test_import_upstream_records() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    let import_path = temp_dir.path().join("export.json");
    fs::write(
        &import_path,
        r#"[
            {"_id": "UP-1", "clientId": "acme", "total": 100, "paidAmount": 40, "isPaid": true},
            {"id": "UP-2", "client": "acme", "amount": 60, "status": "PAGADO"}
        ]"#,
    )
    .unwrap();

    ledger_cmd()
        .args(["-C", &config_path, "import", import_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("UP-1 - acme - PARTIAL"))
        .stdout(predicate::str::contains("UP-2 - acme - PAID"))
        .stdout(predicate::str::contains("Imported 2 invoice(s)"));

    ledger_cmd()
        .args(["-C", &config_path, "import", import_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_invalid_index() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    write_state(&config_path, TWO_INVOICES);

    ledger_cmd()
        .args(["-C", &config_path, "payments", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid invoice index"));
}

#[test]
fn test_list_footer_totals() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    write_state(&config_path, TWO_INVOICES);

    ledger_cmd()
        .args(["-C", &config_path, "pay", "INV-2026-0002", "250"])
        .assert()
        .success();

    ledger_cmd()
        .args(["-C", &config_path, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TOTAL"))
        .stdout(predicate::str::contains("$1,450.00"))
        .stdout(predicate::str::contains("(-) PAID"))
        .stdout(predicate::str::contains("$250.00"))
        .stdout(predicate::str::contains("(=) OUTSTANDING"))
        .stdout(predicate::str::contains("$1,200.00"));
}

#[test]
fn test_backdated_payment_is_recorded_on_given_date() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = init(&temp_dir);
    write_state(&config_path, TWO_INVOICES);

    ledger_cmd()
        .args([
            "-C",
            &config_path,
            "pay",
            "INV-2026-0002",
            "100",
            "--date",
            "2020-01-15",
        ])
        .assert()
        .success();

    ledger_cmd()
        .args(["-C", &config_path, "payments", "INV-2026-0002"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2020-01-15"))
        .stdout(predicate::str::contains("Status: PARTIAL"));
}
