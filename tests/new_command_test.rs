use assert_cmd::Command;
use predicates::prelude::*;

fn cargo_liquid() -> Command {
    let mut cmd = Command::cargo_bin("cargo-liquid").unwrap();
    cmd.arg("liquid");
    cmd
}

#[test]
fn test_new_scaffolds_contract() {
    let dir = tempfile::tempdir().unwrap();

    cargo_liquid()
        .current_dir(dir.path())
        .args(["new", "ballot-box"])
        .assert()
        .success()
        .stdout(predicate::str::contains("contract `ballot-box`"));

    let contract = dir.path().join("ballot-box");
    let manifest = std::fs::read_to_string(contract.join("Cargo.toml")).unwrap();
    let manifest: toml::Table = manifest.parse().unwrap();
    assert_eq!(manifest["package"]["name"].as_str(), Some("ballot-box"));
    assert_eq!(manifest["lib"]["name"].as_str(), Some("ballot_box"));

    let lib = std::fs::read_to_string(contract.join("src/lib.rs")).unwrap();
    assert!(lib.contains("fn deploy()"));
    assert!(lib.contains("fn call()"));
}

#[test]
fn test_new_into_target_dir() {
    let dir = tempfile::tempdir().unwrap();

    cargo_liquid()
        .args(["new", "token", "--target-dir"])
        .arg(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("token/.gitignore").exists());
}

#[test]
fn test_new_rejects_invalid_name() {
    let dir = tempfile::tempdir().unwrap();

    cargo_liquid()
        .current_dir(dir.path())
        .args(["new", "9lives"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid contract name '9lives'"));

    assert!(!dir.path().join("9lives").exists());
}

#[test]
fn test_new_requires_force_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("token")).unwrap();
    std::fs::write(dir.path().join("token/notes.txt"), "keep me").unwrap();

    cargo_liquid()
        .current_dir(dir.path())
        .args(["new", "token"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    assert!(dir.path().join("token/notes.txt").exists());

    cargo_liquid()
        .current_dir(dir.path())
        .args(["new", "token", "--force"])
        .assert()
        .success();
    assert!(!dir.path().join("token/notes.txt").exists());
    assert!(dir.path().join("token/Cargo.toml").exists());
}
