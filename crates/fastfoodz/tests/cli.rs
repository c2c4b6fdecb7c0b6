//! End-to-end checks of the `foodz` binary.

use std::path::PathBuf;
use std::process::{Command, Output};

/// A TOML file in the temp dir, removed on drop.
struct TempConfig(PathBuf);

impl TempConfig {
    fn new(name: &str, contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "fastfoodz_cli_{name}_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).expect("failed to write temp config");
        Self(path)
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn foodz(args: &[&std::ffi::OsStr]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_foodz"));
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("FASTFOODZ_") {
            cmd.env_remove(key);
        }
    }
    cmd.args(args).output().expect("failed to run foodz")
}

const BROKEN: &str = "[storage]\nkeep_snapshots = 0\n";
const VALID: &str = "[storage]\nprune_threshold = 6\nkeep_snapshots = 3\n";

#[test]
fn test_validate_file_ignores_broken_global_config() {
    let broken = TempConfig::new("broken_global", BROKEN);
    let valid = TempConfig::new("valid_target", VALID);

    let output = foodz(&[
        "-c".as_ref(),
        broken.0.as_os_str(),
        "config".as_ref(),
        "validate".as_ref(),
        "--file".as_ref(),
        valid.0.as_os_str(),
    ]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Configuration is valid."));
}

#[test]
fn test_validate_reports_broken_config() {
    let broken = TempConfig::new("broken_only", BROKEN);

    let output = foodz(&[
        "-c".as_ref(),
        broken.0.as_os_str(),
        "config".as_ref(),
        "validate".as_ref(),
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("keep_snapshots must be at least 1"));
}

#[test]
fn test_config_path_with_broken_config() {
    let broken = TempConfig::new("broken_path", BROKEN);

    let output = foodz(&["-c".as_ref(), broken.0.as_os_str(), "config".as_ref(), "path".as_ref()]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        broken.0.display().to_string()
    );
}
