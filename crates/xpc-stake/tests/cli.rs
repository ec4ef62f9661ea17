//! Runs the xpc-stake binary and checks its JSON output.
//!
//! Run with:
//!   cargo test -p xpc-stake --test cli

use std::path::PathBuf;
use std::process::{Command, Output};

use xpc_core::transaction::{Block, OutPoint, Transaction, TxIn, TxOut};
use xpc_core::types::{Hash160, TxId};
use xpc_core::Script;

fn xpc_stake(args: &[&str]) -> serde_json::Value {
    let out = Command::new(env!("CARGO_BIN_EXE_xpc-stake"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawning xpc-stake");
    assert!(
        out.status.success(),
        "xpc-stake {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout is JSON")
}

fn run_raw(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xpc-stake"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("spawning xpc-stake")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("xpc-stake-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn phase_on_testnet() {
    let v = xpc_stake(&["--network", "test", "phase", "--height", "1153"]);
    assert_eq!(v["phase"], 1);
    assert_eq!(v["blocks_into_phase"], 1);

    let v = xpc_stake(&["--network", "test", "phase", "--height", "128"]);
    assert_eq!(v["phase"], 0);
    assert_eq!(v["blocks_into_phase"], 0);
}

#[test]
fn rate_and_reward_in_phase_one() {
    // Testnet phase 1, 100 blocks in; a coin that old earns the 0.60% floor.
    let v = xpc_stake(&["--network", "test", "rate", "--height", "1252", "--coin-age", "100"]);
    assert_eq!(v["rate"], 60);

    let v = xpc_stake(&[
        "--network", "test", "reward", "--height", "1252", "--amount", "1000", "--coin-age", "100",
    ]);
    assert_eq!(v["reward"], 600_000_000i64);
}

#[test]
fn rate_ceiling_is_an_error() {
    // Testnet phases are too short to reach a ceiling; use mainnet-length
    // phases starting at height 0.
    let dir = scratch_dir("ceiling");
    std::fs::create_dir_all(&dir).unwrap();
    let params = dir.join("params.json");
    std::fs::write(
        &params,
        r#"{"network":"main","abpos_height":0,"stake_min_age":259200,
            "stake_max_age":5184000,"pubkey_address_prefix":75,"script_address_prefix":18}"#,
    )
    .unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_xpc-stake"))
        .args(["--params", params.to_str().unwrap(), "rate", "--height", "1051200", "--coin-age", "0"])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    assert!(!out.status.success());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn exception_lookup() {
    let known = "86f5b30e2e17478fa93fed5994f9ec99cf00874a662b5ad8f0242e178efae112";
    let v = xpc_stake(&["exception", "--txid", known]);
    assert_eq!(v["known"], true);

    let zeros = "00".repeat(32);
    let v = xpc_stake(&["exception", "--txid", zeros.as_str()]);
    assert_eq!(v["known"], false);
}

#[test]
fn probability_zero_minutes() {
    let v = xpc_stake(&[
        "probability", "--amount", "500", "--since", "1000000", "--now", "5000000",
        "--difficulty", "1.5", "--minutes", "0",
    ]);
    assert_eq!(v["probability"], 0.0);
    assert_eq!(v["age_days"], 46);
}

#[test]
fn keygen_writes_keyfile_once() {
    let dir = scratch_dir("keygen");
    let keyfile = dir.join("key.json");
    let path = keyfile.to_str().unwrap();

    let run = |expect_ok: bool| {
        let out = Command::new(env!("CARGO_BIN_EXE_xpc-stake"))
            .args(["--network", "test", "keygen", "--keyfile", path])
            .env("RUST_LOG", "off")
            .output()
            .unwrap();
        assert_eq!(out.status.success(), expect_ok);
    };
    run(true);
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&keyfile).unwrap()).unwrap();
    assert_eq!(saved["network"], "test");
    assert_eq!(saved["public_key"].as_str().unwrap().len(), 66);
    assert!(saved["address"].is_string());

    // Refuses to overwrite.
    run(false);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn zero_coin_params_fail_cleanly() {
    let dir = scratch_dir("zero-coin");
    std::fs::create_dir_all(&dir).unwrap();
    let params = dir.join("params.json");
    std::fs::write(
        &params,
        r#"{"network":"main","abpos_height":0,"stake_min_age":259200,"coin":0,
            "stake_max_age":5184000,"pubkey_address_prefix":75,"script_address_prefix":18}"#,
    )
    .unwrap();

    let path = params.to_str().unwrap();
    let out = run_raw(&["--params", path, "reward", "--height", "600000", "--amount", "10", "--coin-age", "5"]);
    // Exit code 1 is an error return; a panic would exit with 101.
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("coin must be positive"));

    let out = run_raw(&[
        "--params", path, "probability", "--amount", "10", "--since", "0", "--now", "9000000",
        "--difficulty", "1", "--minutes", "60",
    ]);
    assert_eq!(out.status.code(), Some(1));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decimal_amount_is_rounded() {
    let v = xpc_stake(&["legacy", "--height", "1", "--amount", "0.29", "--age-secs", "0"]);
    assert_eq!(v["amount"], 29_000_000i64);
}

#[test]
fn keygen_then_sign_manifest_verifies() {
    let dir = scratch_dir("sign");
    std::fs::create_dir_all(&dir).unwrap();
    let keyfile = dir.join("key.json");
    let keyfile_path = keyfile.to_str().unwrap();

    assert!(run_raw(&["--network", "test", "keygen", "--keyfile", keyfile_path]).status.success());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&keyfile).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&keyfile).unwrap()).unwrap();
    let pubkey = hex::decode(saved["public_key"].as_str().unwrap()).unwrap();
    let key_id = xpc_crypto::hash160(&pubkey);

    let payee = Script::new_p2pkh(&Hash160([9; 20]));
    let manifest = dir.join("manifest.json");
    std::fs::write(
        &manifest,
        serde_json::json!([{ "script": hex::encode(payee.as_bytes()), "amount": 300_000_000i64 }])
            .to_string(),
    )
    .unwrap();

    let stake_txid = "11".repeat(32);
    let v = xpc_stake(&[
        "--network", "test", "sign-manifest",
        "--keyfile", keyfile_path,
        "--manifest", manifest.to_str().unwrap(),
        "--time", "1700000000",
        "--stake-txid", stake_txid.as_str(),
        "--stake-vout", "1",
    ]);
    let outputs: Vec<TxOut> = serde_json::from_value(v["outputs"].clone()).unwrap();
    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[1], TxOut::new(300_000_000, payee));
    assert_eq!(outputs[2].value, 0);

    let coinbase = Transaction::new(vec![TxIn::new(OutPoint::null())], outputs);
    let coinstake = Transaction::new(
        vec![TxIn::new(OutPoint::new(TxId::from_hex(&stake_txid).unwrap(), 1))],
        vec![TxOut::new(0, Script::new_p2pkh(&key_id))],
    );
    let mut block = Block {
        time: 1_700_000_000,
        transactions: vec![coinbase, coinstake],
    };

    let block_path = dir.join("block.json");
    std::fs::write(&block_path, serde_json::to_string(&block).unwrap()).unwrap();
    let v = xpc_stake(&["verify-coinbase", "--block", block_path.to_str().unwrap()]);
    assert_eq!(v["valid"], true);

    // The signature commits to the block time.
    block.time += 1;
    std::fs::write(&block_path, serde_json::to_string(&block).unwrap()).unwrap();
    let v = xpc_stake(&["verify-coinbase", "--block", block_path.to_str().unwrap()]);
    assert_eq!(v["valid"], false);

    let _ = std::fs::remove_dir_all(&dir);
}
