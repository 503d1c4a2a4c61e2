//! Integration tests for the `pl` binary.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn pl() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pl"));
    cmd.env("NO_COLOR", "1")
        .env("PL_ANCHOR_ENABLED", "false")
        .env("PL_LOG", "warn");
    cmd
}

fn serve(requests: &[&str]) -> Vec<serde_json::Value> {
    let mut child = pl()
        .arg("serve")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn pl serve");

    {
        let stdin = child.stdin.as_mut().unwrap();
        for req in requests {
            writeln!(stdin, "{req}").unwrap();
        }
    }
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "serve failed: {output:?}");

    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_serve_bike_scenario() {
    let responses = serve(&[
        r#"{"op":"create","productId":"BIKE-001","owner":"A","metadata":"steel frame"}"#,
        r#"{"op":"transfer","productId":"BIKE-001","currentOwner":"A","nextOwner":"B"}"#,
        r#"{"op":"transfer","productId":"BIKE-001","currentOwner":"A","nextOwner":"C"}"#,
        r#"{"op":"repair","productId":"BIKE-001","owner":"B","metadata":"brake service"}"#,
        r#"{"op":"query","owner":"b"}"#,
        r#"{"op":"history","productId":"BIKE-001"}"#,
        r#"{"op":"recent","limit":2}"#,
    ]);

    assert_eq!(responses.len(), 7);
    assert_eq!(responses[0]["ok"], true);
    assert_eq!(responses[0]["result"]["anchor"], "local");
    assert_eq!(responses[1]["result"]["previousOwner"], "A");
    assert_eq!(responses[2]["ok"], false);
    assert_eq!(responses[2]["error"]["code"], "OwnershipMismatch");
    assert_eq!(responses[3]["result"]["kind"], "Repair");

    let query = responses[4]["result"].as_array().unwrap();
    assert_eq!(query.len(), 2);
    assert!(query.iter().all(|e| e["kind"] != "Manufacture"));

    assert_eq!(responses[5]["result"].as_array().unwrap().len(), 3);
    assert_eq!(responses[6]["result"].as_array().unwrap().len(), 2);
}

#[test]
fn test_serve_from_input_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("requests.jsonl");
    fs::write(
        &input,
        "{\"op\":\"create\",\"productId\":\"X\",\"owner\":\"o\"}\n{\"op\":\"create\",\"productId\":\"X\",\"owner\":\"o\"}\n",
    )
    .unwrap();

    let output = pl()
        .args(["serve", "--input", input.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("DuplicateProduct"));
}

fn export_history(dir: &Path) -> std::path::PathBuf {
    let responses = serve(&[
        r#"{"op":"create","productId":"LAMP-7","owner":"maker"}"#,
        r#"{"op":"transfer","productId":"LAMP-7","currentOwner":"maker","nextOwner":"shop"}"#,
        r#"{"op":"repair","productId":"LAMP-7","owner":"shop","metadata":"new bulb"}"#,
        r#"{"op":"history","productId":"LAMP-7"}"#,
    ]);
    let path = dir.join("lamp.json");
    fs::write(
        &path,
        serde_json::to_string_pretty(&responses[3]["result"]).unwrap(),
    )
    .unwrap();
    path
}

#[test]
fn test_history_log_and_verify() {
    let dir = TempDir::new().unwrap();
    let path = export_history(dir.path());

    let output = pl()
        .args(["history", "log", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Product History"));
    assert!(text.contains("LAMP-7"));
    assert!(text.contains("Event 3"));
    assert!(text.contains("new bulb"));

    let output = pl()
        .args(["history", "verify", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Chain of custody valid"));
    assert!(text.contains("VALID"));
}

#[test]
fn test_history_verify_detects_tampering() {
    let dir = TempDir::new().unwrap();
    let path = export_history(dir.path());

    let mut events: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    events[1]["previousOwner"] = serde_json::json!("impostor");
    fs::write(&path, serde_json::to_string(&events).unwrap()).unwrap();

    let output = pl()
        .args(["history", "verify", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("chain-of-custody verification failed"));
}

#[test]
fn test_encode() {
    let output = pl().args(["encode", "3a"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "21");

    let output = pl().args(["encode", "0x000000"]).output().unwrap();
    assert_eq!(stdout(&output).trim(), "111");

    let output = pl().args(["encode", "zz"]).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_keygen_to_file_and_info() {
    let dir = TempDir::new().unwrap();
    let key_path = dir.path().join("anchor-key.json");

    let output = pl()
        .args(["keygen", key_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let keypair: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&key_path).unwrap()).unwrap();
    assert!(keypair["private_key"].is_string());
    assert!(keypair["public_key"].is_string());

    let address = stdout(&output)
        .lines()
        .find_map(|l| l.strip_prefix("Address: ").map(str::to_string))
        .unwrap();

    let config_path = dir.path().join("pl.toml");
    fs::write(
        &config_path,
        format!(
            "[anchor]\nnetwork = \"localnet\"\nkeypair_file = {:?}\n",
            key_path.to_str().unwrap()
        ),
    )
    .unwrap();

    let output = pl()
        .args(["info", "--config", config_path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("network: localnet"));
    assert!(text.contains("rpc_url: http://127.0.0.1:8899"));
    assert!(text.contains("anchoring: false"));
    assert!(text.contains(&format!("public_key: {address}")));
}

#[test]
fn test_keygen_stdout() {
    let output = pl().arg("keygen").output().unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Generated Ed25519 Keypair"));
    assert!(text.contains("Private Key"));
    assert!(text.contains("Public Key"));
}

#[test]
fn test_history_log_non_ascii_signature() {
    let dir = TempDir::new().unwrap();
    let path = export_history(dir.path());

    let mut events: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let signature = format!("{}é{}", "a".repeat(19), "b".repeat(10));
    events[0]["signature"] = serde_json::json!(signature);
    fs::write(&path, serde_json::to_string(&events).unwrap()).unwrap();

    let output = pl()
        .args(["history", "log", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "history log failed: {output:?}");
    assert!(stdout(&output).contains(&format!("{}é...", "a".repeat(19))));
}
