//! Integration tests for the `omctl` binary.
//!
//! Each test points the config directory at a temp dir so the user's real
//! configuration is never read.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn omctl(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("omctl");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("OPENMOTICS_PROFILE")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(home: &Path, body: &str) {
    let dir = home.join("openmotics");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), body).unwrap();
}

fn local_profile(home: &Path, base_url: &str) {
    write_config(
        home,
        &format!(
            r#"
default_profile = "home"

[profiles.home]
backend = "local"
base_url = "{base_url}"
username = "admin"
password = "secret"
"#
        ),
    );
}

fn cloud_profile(home: &Path, base_url: &str) {
    write_config(
        home,
        &format!(
            r#"
default_profile = "cloud"

[profiles.cloud]
base_url = "{base_url}"
installation_id = 5
token = "test-token"
"#
        ),
    );
}

async fn mount_gateway_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "token": "abc"})),
        )
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = omctl(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    omctl(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("outputs")
            .and(predicate::str::contains("shutters"))
            .and(predicate::str::contains("groupactions")),
    );
}

#[test]
fn test_unknown_profile_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    local_profile(home.path(), "http://127.0.0.1:9");

    omctl(home.path())
        .args(["--profile", "office", "outputs", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("office"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let home = TempDir::new().unwrap();
    local_profile(home.path(), "http://127.0.0.1:9");

    omctl(home.path())
        .args(["--timeout", "0", "sensors", "list"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_use_switches_default_profile() {
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        r#"
default_profile = "home"

[profiles.home]
backend = "local"
host = "192.168.0.50"

[profiles.cloud]
token = "test-token"
"#,
    );

    omctl(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("home (local) *")
                .and(predicate::str::contains("cloud (cloud)\n")),
        );

    omctl(home.path()).args(["config", "use", "cloud"]).assert().success();

    omctl(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cloud (cloud) *"));
}

#[test]
fn test_config_use_rejects_unknown_profile() {
    let home = TempDir::new().unwrap();
    local_profile(home.path(), "http://127.0.0.1:9");

    omctl(home.path())
        .args(["config", "use", "office"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("office"));

    let saved = std::fs::read_to_string(home.path().join("openmotics/config.toml")).unwrap();
    assert!(saved.contains(r#"default_profile = "home""#));
}

// ── Against a mock gateway ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_local_outputs_list_prints_json() {
    let server = MockServer::start().await;
    mount_gateway_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/get_output_configurations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "config": [{"id": 3, "name": "Hall", "type": 255, "module_type": "D"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/get_output_status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": [{"id": 3, "status": 1, "dimmer": 60}]
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    local_profile(home.path(), &server.uri());

    let output = omctl(home.path())
        .args(["-o", "json-compact", "outputs", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["id"], 3);
    assert_eq!(listed[0]["name"], "Hall");
    assert_eq!(listed[0]["status"]["value"], 60);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_local_group_action_trigger() {
    let server = MockServer::start().await;
    mount_gateway_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/do_group_action"))
        .and(body_string_contains("group_action_id=4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    local_profile(home.path(), &server.uri());

    omctl(home.path())
        .args(["groupactions", "trigger", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("success"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refused_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    local_profile(home.path(), &server.uri());

    omctl(home.path())
        .args(["shutters", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn test_installations_are_cloud_only() {
    let home = TempDir::new().unwrap();
    local_profile(home.path(), "http://127.0.0.1:9");

    omctl(home.path())
        .args(["installations", "list"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("local backend"));
}

// ── Against a mock cloud ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_cloud_installations_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/base/installations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 5, "name": "Home"}]
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    cloud_profile(home.path(), &server.uri());

    omctl(home.path())
        .args(["installations", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Home\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tls_failure_suggests_insecure() {
    // Speaking TLS to a plain-HTTP server fails during the handshake.
    let server = MockServer::start().await;
    let https = server.uri().replacen("http://", "https://", 1);

    let home = TempDir::new().unwrap();
    cloud_profile(home.path(), &https);

    omctl(home.path())
        .args(["sensors", "list"])
        .assert()
        .code(9)
        .stderr(predicate::str::contains("--insecure"));
}
