use assert_cmd::cargo_bin;
use std::process::Command;

mod common;

#[test]
fn test_many_payments_streaming() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("large_test.csv");
    common::generate_csv(&output_path, 20_000).expect("Failed to generate CSV");

    let output = Command::new(cargo_bin!("paybridge"))
        .arg("status")
        .arg(&output_path)
        .arg("--payment-status")
        .arg("paid")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Binary failed to process generated file");

    let stdout = String::from_utf8_lossy(&output.stdout);
    // header + one row per payment
    assert_eq!(stdout.lines().count(), 20_001);
    assert!(
        stdout
            .lines()
            .skip(1)
            .all(|line| line.ends_with(",execute_payment_response,success,false"))
    );
}
