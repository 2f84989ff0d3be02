use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_malformed_csv_handling() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("robustness_test.csv");
    let mut wtr = csv::Writer::from_path(&output_path).unwrap();
    wtr.write_record(["project", "payment", "timestamp", "type"])
        .unwrap();

    // Valid request
    wtr.write_record(["1", "1", "2024-05-01T12:00:00Z", "create_payment"])
        .unwrap();
    // Unparsable timestamp
    wtr.write_record(["1", "1", "noon", "create_payment_response"])
        .unwrap();
    // Non-integer project id
    wtr.write_record(["abc", "2", "2024-05-01T12:00:00Z", "error"])
        .unwrap();
    // Valid request for another payment
    wtr.write_record(["1", "3", "2024-05-01T12:00:00Z", "get_payment"])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("paybridge"));
    cmd.arg("status").arg(&output_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading transaction"))
        .stdout(predicate::str::contains("1,1,create_payment,pending,true"))
        .stdout(predicate::str::contains("1,3,get_payment,pending,true"))
        .stdout(predicate::str::contains("1,2,").not());
}

#[test]
fn test_unknown_transaction_type_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("unknown_type.csv");
    let mut wtr = csv::Writer::from_path(&output_path).unwrap();
    wtr.write_record(["project", "payment", "timestamp", "type"])
        .unwrap();
    wtr.write_record(["1", "1", "2024-05-01T12:00:00Z", "refund_payment"])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("paybridge"));
    cmd.arg("status").arg(&output_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("unrecognized provider transaction type"))
        .stdout(predicate::str::contains("1,1,refund_payment,error,false"));
}

#[test]
fn test_missing_input_file() {
    let mut cmd = Command::new(cargo_bin!("paybridge"));
    cmd.arg("status").arg("tests/fixtures/does_not_exist.csv");

    cmd.assert().failure();
}
