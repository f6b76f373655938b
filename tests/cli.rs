use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn bin() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("scryptbox"));
    cmd.env_remove("SCRYPTBOX_TIMEOUT_MS");
    cmd
}

fn seal(input: &Path, output: &Path, password: &str) -> assert_cmd::assert::Assert {
    bin()
        .env("SCRYPTBOX_PASSWORD", password)
        .arg("seal")
        .arg(input)
        .arg(output)
        .arg("--timeout-ms")
        .arg("1")
        .assert()
}

#[test]
fn seal_creates_envelope() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("plain.sbox");
    fs::write(&input, "top secret").unwrap();

    seal(&input, &output, "pw")
        .success()
        .stdout(predicate::str::contains("sealed").and(predicate::str::contains("log_n=")));

    let envelope = fs::read(&output).unwrap();
    assert_eq!(&envelope[..4], b"SBOX");
    assert!(!envelope.windows(10).any(|w| w == b"top secret"));
}

#[test]
fn seal_and_open_roundtrip_to_stdout() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("plain.sbox");
    fs::write(&input, "top secret").unwrap();

    seal(&input, &output, "pw").success();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("open")
        .arg(&output)
        .assert()
        .success()
        .stdout("top secret");
}

#[test]
fn open_to_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("plain.sbox");
    let restored = dir.path().join("restored.txt");
    fs::write(&input, "bytes on disk").unwrap();

    seal(&input, &output, "pw").success();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("open")
        .arg(&output)
        .arg(&restored)
        .assert()
        .success()
        .stdout(predicate::str::contains("opened"));

    assert_eq!(fs::read_to_string(&restored).unwrap(), "bytes on disk");
}

#[test]
fn wrong_password_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("plain.sbox");
    fs::write(&input, "top secret").unwrap();

    seal(&input, &output, "pw").success();

    bin()
        .env("SCRYPTBOX_PASSWORD", "wrong_pw")
        .arg("open")
        .arg(&output)
        .assert()
        .failure()
        .stdout(predicate::str::contains("top secret").not())
        .stderr(predicate::str::contains("invalid password or corrupted data"));
}

#[test]
fn piped_passwords_must_match() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("plain.sbox");
    fs::write(&input, "top secret").unwrap();

    bin()
        .env_remove("SCRYPTBOX_PASSWORD")
        .arg("seal")
        .arg(&input)
        .arg(&output)
        .arg("--timeout-ms")
        .arg("1")
        .write_stdin("one\ntwo\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("passwords do not match"));

    assert!(!output.exists());
}

#[test]
fn piped_password_opens() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("plain.sbox");
    fs::write(&input, "piped").unwrap();

    bin()
        .env_remove("SCRYPTBOX_PASSWORD")
        .arg("seal")
        .arg(&input)
        .arg(&output)
        .arg("--timeout-ms")
        .arg("1")
        .write_stdin("pw\npw\n")
        .assert()
        .success();

    bin()
        .env_remove("SCRYPTBOX_PASSWORD")
        .arg("open")
        .arg(&output)
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout("piped");
}

#[test]
fn inspect_prints_header_without_password() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("plain.sbox");
    fs::write(&input, "top secret").unwrap();

    seal(&input, &output, "pw").success();

    let assert = bin()
        .env_remove("SCRYPTBOX_PASSWORD")
        .arg("inspect")
        .arg(&output)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let header: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert!(header["log_n"].as_u64().unwrap() >= 14);
    assert_eq!(header["r"], 8);
    assert_eq!(header["p"], 1);
    assert!(header.get("key").is_none());
}

#[test]
fn short_salt_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("plain.sbox");
    fs::write(&input, "top secret").unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("seal")
        .arg(&input)
        .arg(&output)
        .arg("--salt-len")
        .arg("16")
        .assert()
        .failure()
        .stderr(predicate::str::contains("salt length"));

    assert!(!output.exists());
}

#[test]
fn corrupted_envelope_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("plain.txt");
    let output = dir.path().join("plain.sbox");
    fs::write(&input, "top secret").unwrap();

    seal(&input, &output, "pw").success();

    let mut envelope = fs::read(&output).unwrap();
    let last = envelope.len() - 1;
    envelope[last] ^= 0xff;
    fs::write(&output, envelope).unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("open")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid password or corrupted data"));
}

#[test]
fn missing_envelope_fails() {
    let dir = tempdir().unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("open")
        .arg(dir.path().join("missing.sbox"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("I/O error"));
}
