#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: the create request and its response
    let mut csv1 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv1, "project, payment, timestamp, type, state, reference, data").unwrap();
    writeln!(csv1, "1, 1, 2024-05-01T12:00:00Z, create_payment, , ,").unwrap();
    writeln!(csv1, "1, 1, 2024-05-01T12:00:01Z, create_payment_response, created, PAY-1,").unwrap();

    let mut cmd1 = Command::new(cargo_bin!("paybridge"));
    cmd1.arg("status").arg(csv1.path()).arg("--db-path").arg(&db_path);

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("1,1,create_payment_response,awaiting_approval,false"));

    // 2. Second run: an older record arrives late and must not become latest
    let mut csv2 = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv2, "project, payment, timestamp, type, state, reference, data").unwrap();
    writeln!(csv2, "1, 1, 2024-05-01T11:59:59Z, get_payment, , PAY-1,").unwrap();

    let mut cmd2 = Command::new(cargo_bin!("paybridge"));
    cmd2.arg("status").arg(csv2.path()).arg("--db-path").arg(&db_path);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("1,1,create_payment_response,awaiting_approval,false"));
}
