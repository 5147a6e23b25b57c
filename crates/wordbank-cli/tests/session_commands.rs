//! Commands run against a mock backend, sharing one WORDBANK_HOME.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{bearer_token, body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn wordbank(home: &TempDir, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("wordbank");
    cmd.env("WORDBANK_HOME", home.path())
        .env_remove("WORDBANK_BASE_URL")
        .arg("--base-url")
        .arg(server.uri());
    cmd
}

fn user() -> serde_json::Value {
    json!({ "id": "u1", "email": "ada@example.com", "username": "ada" })
}

#[tokio::test]
async fn test_login_persists_session_for_later_commands() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "payload": { "token": "t1", "refreshToken": "r1", "user": user() }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(bearer_token("t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "payload": user() })),
        )
        .mount(&server)
        .await;

    wordbank(&home, &server)
        .args(["login", "--email", "ada@example.com"])
        .env("WORDBANK_PASSWORD", "pw")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as ada"));

    wordbank(&home, &server)
        .arg("me")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"username\": \"ada\""));

    wordbank(&home, &server).arg("onboarded").arg("true").assert().success();
    wordbank(&home, &server)
        .arg("bootstrap")
        .assert()
        .success()
        .stdout(predicate::str::contains("home"));

    wordbank(&home, &server).arg("logout").assert().success();
    wordbank(&home, &server)
        .arg("me")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed in"));
}

#[tokio::test]
async fn test_categories_fall_back_offline() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    wordbank(&home, &server)
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"travel\""))
        .stderr(predicate::str::contains("showing offline categories"));
}

#[tokio::test]
async fn test_first_run_bootstraps_to_onboarding() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    wordbank(&home, &server)
        .arg("bootstrap")
        .assert()
        .success()
        .stdout(predicate::str::contains("onboarding"));
    wordbank(&home, &server)
        .arg("errors")
        .assert()
        .success()
        .stdout(predicate::str::contains("No errors recorded"));
}
