//! Integration tests for the `plexstax` binary.
//!
//! Only start-up paths that exit on their own are exercised here; the
//! running server is covered by `server_test.rs`.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

const ENV_VARS: &[&str] = &[
    "SONARR_URL",
    "SONARR_API_KEY",
    "RADARR_URL",
    "RADARR_API_KEY",
    "SABNZBD_URL",
    "SABNZBD_API_KEY",
    "NZBGET_URL",
    "NZBGET_USER",
    "NZBGET_PASS",
    "OVERSEERR_URL",
    "OVERSEERR_API_KEY",
    "OVERSEER_URL",
    "OVERSEER_API_KEY",
    "TAUTULLI_URL",
    "TAUTULLI_API_KEY",
    "HTTP_TIMEOUT_MS",
    "PROBE_TIMEOUT_MS",
    "TICK_INTERVAL_MS",
    "RIBBONS",
    "IMMEDIATE_PUSH",
    "BIND",
    "INSECURE_TLS",
    "RUST_LOG",
];

/// `plexstax` with a scrubbed environment and no reachable config file.
fn plexstax_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("plexstax");
    cmd.env("HOME", "/tmp/plexstax-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/plexstax-cli-test-nonexistent")
        .env("NO_COLOR", "1");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    plexstax_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("server-sent events")
            .and(predicate::str::contains("--bind"))
            .and(predicate::str::contains("--log-format")),
    );
}

#[test]
fn test_version_flag() {
    plexstax_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("plexstax"));
}

#[test]
fn test_unknown_log_format_is_usage_error() {
    plexstax_cmd()
        .args(["--log-format", "xml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("xml"));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_zero_tick_interval_is_rejected() {
    plexstax_cmd()
        .env("TICK_INTERVAL_MS", "0")
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("Invalid configuration")
                .and(predicate::str::contains("TICK_INTERVAL_MS")),
        );
}

#[test]
fn test_malformed_bind_flag_is_rejected() {
    plexstax_cmd()
        .args(["--bind", "nope"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("BIND").and(predicate::str::contains("nope")));
}

#[test]
fn test_unparseable_flag_in_config_file() {
    let dir = std::env::temp_dir().join(format!("plexstax-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("plexstax.toml");
    std::fs::write(&file, "ribbons = \"sometimes\"\n").unwrap();

    let mut cmd = plexstax_cmd();
    cmd.arg("--config").arg(&file);
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("RIBBONS").and(predicate::str::contains("sometimes")));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_port_in_use_fails_to_bind() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    plexstax_cmd()
        .args(["--bind", &addr])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Cannot listen on").and(predicate::str::contains(addr)));
}
