/// Smoke tests to verify the binary runs without panicking
use std::process::Command;

fn santa_tracker() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_santa-tracker"));
    // Keep the user's settings and log directory out of the way
    let scratch = std::env::temp_dir().join("santa-tracker-smoke");
    cmd.env("XDG_CONFIG_HOME", scratch.join("config"))
        .env("XDG_CACHE_HOME", scratch.join("cache"))
        .env("HOME", &scratch);
    cmd
}

#[test]
fn binary_shows_help() {
    let output = santa_tracker()
        .arg("--help")
        .output()
        .expect("Failed to execute santa-tracker");

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("santa-tracker"),
        "Help output should mention santa-tracker"
    );
    assert!(stdout.contains("track"));
    assert!(stdout.contains("status"));
}

#[test]
fn binary_shows_version() {
    let output = santa_tracker()
        .arg("--version")
        .output()
        .expect("Failed to execute santa-tracker");

    assert!(
        output.status.success(),
        "Binary failed to run --version: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn invalid_subcommand_fails_gracefully() {
    let output = santa_tracker()
        .arg("nonexistent-command")
        .output()
        .expect("Failed to execute santa-tracker");

    // Should fail with error, not panic
    assert!(
        !output.status.success(),
        "Invalid subcommand should return error status"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("panicked at"),
        "Invalid subcommand should not cause panic"
    );
}

#[test]
fn status_reports_midflight_position() {
    let output = santa_tracker()
        .args(["status", "--at", "2024-12-24T12:00:00Z"])
        .output()
        .expect("Failed to execute santa-tracker");

    assert!(
        output.status.success(),
        "status failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Santa is currently in Auckland!"), "{}", stdout);
    assert!(stdout.contains("Progress:  50.0% (in progress)"), "{}", stdout);
    assert!(stdout.contains("Presents Delivered"), "{}", stdout);
}

#[test]
fn status_json_is_machine_readable() {
    let output = santa_tracker()
        .args(["status", "--at", "2024-12-23T22:00:00Z", "--json"])
        .output()
        .expect("Failed to execute santa-tracker");

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status --json should print JSON");
    assert_eq!(report["phase"], "not started");
    assert_eq!(report["place"], "North Pole");
    assert_eq!(report["highlight"]["current"]["kind"], "home_base");
    assert_eq!(report["location"]["lat"], 90.0);
}

#[test]
fn status_rejects_bad_timestamp() {
    let output = santa_tracker()
        .args(["status", "--at", "christmas"])
        .output()
        .expect("Failed to execute santa-tracker");

    assert!(!output.status.success());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("panicked at"));
}
