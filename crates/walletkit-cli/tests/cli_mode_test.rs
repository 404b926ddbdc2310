/*
[INPUT]:  walletkit binary, temp config and storage
[OUTPUT]: End-to-end checks of the offline subcommands
[POS]:    Integration test layer - CLI process
[UPDATE]: When subcommands or their output change
*/

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let config_path = dir.join("config.yaml");
    let yaml = format!(
        "storage:\n  path: {}\n{extra}",
        dir.join("store").join("wallets.json").display()
    );
    std::fs::write(&config_path, yaml).unwrap();
    config_path
}

fn walletkit(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_walletkit"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to start walletkit binary")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "Process exited with non-zero status: {}\nStdout: {}\nStderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn recover_list_show_and_add_asset() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let recovered = stdout_of(&walletkit(&config, &["recover", "--name", "main", "--phrase", PHRASE]));
    assert!(recovered.contains("0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));

    let listed = stdout_of(&walletkit(&config, &["list"]));
    assert!(listed.contains("main"));
    assert!(listed.contains("*"));

    let shown = stdout_of(&walletkit(&config, &["show"]));
    assert!(shown.contains("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"));
    assert!(shown.contains("4EngF3p73rFnEgjcAG5DVQ91QGFze4vsvjVUkAwLjv14"));
    assert!(!shown.contains("abandon"));

    let added = stdout_of(&walletkit(&config, &["add-asset", "ETH2"]));
    assert!(added.contains("0x6Fac4D18c912343BF86fa7049364Dd4E424Ab9C0"));

    let duplicate = walletkit(&config, &["add-asset", "ETH2"]);
    assert!(!duplicate.status.success());
}

#[test]
fn sign_auth_offline_prints_proof() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    stdout_of(&walletkit(&config, &["recover", "--name", "main", "--phrase", PHRASE]));

    let output = stdout_of(&walletkit(&config, &["sign-auth", "--nonce", "abc"]));
    let proof: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(proof["masterAddress"], "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    assert_eq!(proof["nonce"], "abc");
    assert_eq!(proof["signature"].as_str().unwrap().len(), 132);
}

#[test]
fn coupons_smallest_first() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = stdout_of(&walletkit(
        &config,
        &["coupons", "--required", "7", "--coupon", "A=5", "--coupon", "B=20", "--coupon", "C=3"],
    ));
    let c = output.find("C ").unwrap();
    let a = output.find("A ").unwrap();
    assert!(c < a);
    assert!(!output.contains("B "));

    let short = walletkit(&config, &["coupons", "--required", "10", "--coupon", "A=2"]);
    assert!(!short.status.success());
    assert!(String::from_utf8_lossy(&short.stdout).contains("shortfall: 8"));
}

#[test]
fn unknown_wallet_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = walletkit(&config, &["select", "00000000-0000-0000-0000-000000000000"]);
    assert!(!output.status.success());
}
