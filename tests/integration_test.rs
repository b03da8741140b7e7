use std::io::Write;
use std::path::Path;

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use assert_cmd::Command;
use predicates as pred;
use predicates::prelude::*;
use tempfile::{NamedTempFile, TempDir};

fn script(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    write!(file, "{}", contents).unwrap();
    file
}

fn admin_hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

fn ledger(data_dir: &Path, file: &NamedTempFile) -> Command {
    let exe = env!("CARGO_BIN_EXE_reward_ledger");
    let mut cmd = Command::new(exe);
    cmd.arg(file.path())
        .env("REWARD_LEDGER_DATA_DIR", data_dir)
        .env("REWARD_LEDGER_LOG", "warn");
    cmd
}

fn referral_code_of(data_dir: &Path, number: &str) -> String {
    let raw = std::fs::read_to_string(data_dir.join("accounts.json")).unwrap();
    let accounts: serde_json::Value = serde_json::from_str(&raw).unwrap();
    accounts
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["paymentNumber"] == number)
        .and_then(|a| a["referralCode"].as_str())
        .unwrap()
        .to_string()
}

#[test]
fn end_to_end_outputs_expected_balances() {
    let data = TempDir::new().unwrap();

    // Rina earns 150 over three ads and reserves 100 for a withdrawal.
    let first = script(
        "type, device, number, arg, value\n\
         register, fp_r, 081200000001, Rina\n\
         login, fp_r, 081200000001\n\
         quiz, , , 1, 4\n\
         ad, , , , 50\n\
         quiz, , , 2, 7\n\
         ad, , , , 50\n\
         quiz, , , 4, 50\n\
         ad, , , , 50\n\
         withdraw, , , , 100\n",
    );
    ledger(data.path(), &first)
        .assert()
        .success()
        .stdout(pred::str::contains(
            "number,name,balance,total_earned,referral_earnings,ads_watched,referral_count",
        ))
        .stdout(pred::str::contains("081200000001,Rina,50,150,0,3,0"));

    // Iwan signs up with Rina's code, earns once; the admin rejects Rina's
    // withdrawal and blocks Iwan's device.
    let code = referral_code_of(data.path(), "081200000001");
    let second = script(&format!(
        "type, device, number, arg, value\n\
         register, fp_i, 081200000002, Iwan, {}\n\
         login, fp_i, 081200000002\n\
         quiz, , , 1, 4\n\
         ad, , , , 35\n\
         chah, 1,\n\
         admin, , , , correct horse\n\
         reject, , 081200000001\n\
         block, , 081200000002\n\
         login, fp_i, 081200000002\n\
         withdraw, , , , 100\n",
        code.to_lowercase()
    ));
    ledger(data.path(), &second)
        .env("REWARD_LEDGER_ADMIN_PASSWORD_HASH", admin_hash("correct horse"))
        .assert()
        .success()
        .stdout(pred::str::contains("081200000001,Rina,157,150,7,3,1"))
        .stdout(pred::str::contains("081200000002,Iwan,85,35,0,1,0"))
        .stderr(pred::str::contains("invalid command type: chah"))
        .stderr(pred::str::contains("Access denied: device is blocked"))
        .stderr(pred::str::contains("Insufficient balance"));
}

#[test]
fn duplicate_device_is_reported_and_skipped() {
    let data = TempDir::new().unwrap();
    let file = script(
        "type, device, number, arg, value\n\
         register, fp_a, 081200000001, Budi\n\
         register, fp_a, 081200000002, Sari\n\
         register, fp_b, 12345, Tono\n",
    );

    ledger(data.path(), &file)
        .assert()
        .success()
        .stdout(pred::str::contains("081200000001,Budi,0,0,0,0,0"))
        .stdout(pred::str::contains("081200000002").not())
        .stdout(pred::str::contains("Tono").not())
        .stderr(pred::str::contains("This device already has an account"))
        .stderr(pred::str::contains("Payment number must be 10-13 digits"));
}

#[test]
fn missing_argument_fails() {
    let exe = env!("CARGO_BIN_EXE_reward_ledger");
    Command::new(exe)
        .assert()
        .failure()
        .stderr(pred::str::contains("usage"));
}
