//! Integration tests for CLI commands.

use hibon::Hibon;
use hibon_hirpc::Envelope;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_hibon"))
        .args(args)
        .env("HIBON_LOG", "off")
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    (output.status.success(), stdout, stderr)
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn write_alice(dir: &TempDir) -> String {
    let mut doc = Hibon::new();
    doc.add_string("name", "alice").unwrap();
    doc.add_i32("age", 30).unwrap();
    let path = dir.path().join("alice.hibon");
    std::fs::write(&path, doc.to_document()).unwrap();
    path_str(&path)
}

fn keygen(dir: &TempDir) -> String {
    let device = path_str(&dir.path().join("device.hibon"));
    let (success, stdout, stderr) = run_cli(&[
        "keygen",
        "--passphrase",
        "correct horse",
        "--salt",
        "salt",
        "--pin",
        "1234",
        "--out",
        &device,
    ]);
    assert!(success, "keygen failed: {}", stderr);
    assert!(stdout.contains("public key"));
    device
}

#[test]
fn test_text_command() {
    let dir = TempDir::new().unwrap();
    let doc = write_alice(&dir);

    let (success, stdout, _) = run_cli(&["text", &doc, "--format", "json"]);
    assert!(success);
    assert_eq!(stdout.trim(), r#"{"name":"alice","age":["i32",30]}"#);

    let (success, stdout, _) = run_cli(&["text", &doc, "--format", "hex"]);
    assert!(success);
    assert_eq!(stdout.trim(), "160100000002046e616d6505616c69636511036167651e");
}

#[test]
fn test_text_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    let doc = write_alice(&dir);
    let (success, _, stderr) = run_cli(&["text", &doc, "--format", "xml"]);
    assert!(!success);
    assert!(stderr.contains("unknown text format"));
}

#[test]
fn test_validate_command() {
    let dir = TempDir::new().unwrap();
    let doc = write_alice(&dir);
    let (success, stdout, _) = run_cli(&["validate", &doc]);
    assert!(success);
    assert!(stdout.contains("valid"));

    let broken = dir.path().join("broken.hibon");
    let mut bytes = std::fs::read(&doc).unwrap();
    bytes.push(0);
    std::fs::write(&broken, bytes).unwrap();
    let (success, stdout, stderr) = run_cli(&["validate", &path_str(&broken), "--json"]);
    assert!(!success);
    assert!(stderr.contains("Error"));
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["offset"], 23);
}

#[test]
fn test_dart_index_command() {
    let dir = TempDir::new().unwrap();
    let doc = write_alice(&dir);
    let bytes = std::fs::read(&doc).unwrap();
    let expected = hibon::dart_index(&bytes).unwrap();

    let (success, stdout, _) = run_cli(&["dart-index", &doc]);
    assert!(success);
    assert_eq!(stdout.trim(), expected.to_base64url());

    let (success, stdout, _) = run_cli(&["dart-index", &doc, "--hex"]);
    assert!(success);
    assert_eq!(stdout.trim(), expected.to_hex());
}

#[test]
fn test_sign_with_device() {
    let dir = TempDir::new().unwrap();
    let device = keygen(&dir);
    let message = write_alice(&dir);

    let (success, first, _) = run_cli(&["sign", "--device", &device, "--pin", "1234", &message]);
    assert!(success);
    assert_eq!(first.trim().len(), 128);
    let (_, second, _) = run_cli(&["sign", "--device", &device, "--pin", "1234", &message]);
    assert_eq!(first, second);

    let (success, _, stderr) = run_cli(&["sign", "--device", &device, "--pin", "0000", &message]);
    assert!(!success);
    assert!(stderr.contains("authentication failed"));
}

#[test]
fn test_signed_sender_round_trip() {
    let dir = TempDir::new().unwrap();
    let device = keygen(&dir);
    let params = write_alice(&dir);
    let out = path_str(&dir.path().join("envelope.hibon"));

    let (success, stdout, stderr) = run_cli(&[
        "sender",
        "--method",
        "greet",
        "--params",
        &params,
        "--device",
        &device,
        "--pin",
        "1234",
        "--deriver",
        "0a0b",
        "--out",
        &out,
    ]);
    assert!(success, "sender failed: {}", stderr);
    assert!(stdout.contains("dart index"));

    let bytes = std::fs::read(&out).unwrap();
    let envelope = Envelope::parse(&bytes).unwrap();
    assert_eq!(envelope.method().unwrap(), "greet");
    assert_eq!(envelope.deriver().unwrap(), Some(&[0x0a, 0x0b][..]));
    assert!(envelope.verify().unwrap());

    let (success, stdout, _) = run_cli(&["envelope", &out, "--strict"]);
    assert!(success);
    assert!(stdout.contains("valid"));
}

#[test]
fn test_unsigned_sender_fails_strict_check() {
    let dir = TempDir::new().unwrap();
    let out = path_str(&dir.path().join("envelope.hibon"));
    let (success, _, _) = run_cli(&["sender", "--method", "ping", "--out", &out]);
    assert!(success);

    let (success, stdout, _) = run_cli(&["envelope", &out]);
    assert!(success);
    assert!(stdout.contains("none"));
    let (success, _, stderr) = run_cli(&["envelope", &out, "--strict"]);
    assert!(!success);
    assert!(stderr.contains("did not verify"));
}

#[test]
fn test_missing_file() {
    let (success, _, stderr) = run_cli(&["text", "/nonexistent/doc.hibon"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read file"));
}

#[test]
fn test_log_filter_writes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let device = path_str(&dir.path().join("device.hibon"));
    let output = Command::new(env!("CARGO_BIN_EXE_hibon"))
        .args([
            "keygen",
            "--passphrase",
            "correct horse",
            "--salt",
            "salt",
            "--pin",
            "1234",
            "--out",
            &device,
        ])
        .env("HIBON_LOG", "debug")
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("generated key pair"));
    assert!(!stderr.contains("logging disabled"));
    assert!(!stdout.contains("generated key pair"));
}
