use std::process::Command;

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_grindery-safe-embed"))
}

fn demo_config() -> String {
    format!("{}/examples/config.yaml", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn cli_mode_with_config_and_dry_run_works() {
    let output = binary()
        .arg("--config")
        .arg(demo_config())
        .arg("--dry-run")
        .env("RUST_LOG", "error")
        .output()
        .expect("Failed to start grindery-safe-embed binary");

    assert!(
        output.status.success(),
        "Process exited with non-zero status: {}\nStdout: {}\nStderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn cli_mode_rejects_missing_config() {
    let output = binary()
        .arg("--config")
        .arg("/nonexistent/grindery-safe/config.yaml")
        .arg("--dry-run")
        .output()
        .expect("Failed to start grindery-safe-embed binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("load config"), "stderr: {stderr}");
}

#[test]
fn cli_mode_rejects_invalid_signer_key() {
    let dir = std::env::temp_dir().join(format!("grindery-safe-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let config_path = dir.join("config.yaml");
    std::fs::write(
        &config_path,
        "safe:\n  chain_id: 1\n  address: \"0xABC\"\nsigner:\n  private_key: \"not-hex\"\n",
    )
    .expect("write config");

    let output = binary()
        .arg("--config")
        .arg(&config_path)
        .arg("--dry-run")
        .output()
        .expect("Failed to start grindery-safe-embed binary");
    let _ = std::fs::remove_dir_all(&dir);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("load signer key"), "stderr: {stderr}");
}
