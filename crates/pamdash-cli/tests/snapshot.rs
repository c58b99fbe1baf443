//! `pamdash snapshot` and `pamdash health` against a mock service.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn event(action: &str, score: u8) -> Value {
    json!({
        "id": 1_714_558_530.25,
        "time": "2024-05-01T10:15:30.123456",
        "riskScore": score,
        "action": action,
        "user": {"role": "Database Admin"}
    })
}

async fn mount_get(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_service() -> MockServer {
    let server = MockServer::start().await;
    let events = json!([
        event("GIT_PULL", 50),
        event("DELETE_TABLE", 85),
        event("DROP_DATABASE", 97)
    ]);
    mount_get(&server, "/get_alerts", events.clone()).await;
    mount_get(&server, "/api/all_events", events).await;
    mount_get(
        &server,
        "/api/active_sessions",
        json!([{
            "email": "dba@company.com",
            "role": "Database Admin",
            "login_time": "2024-05-01T09:00:00",
            "strike_count": 1
        }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/settings"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_get(
        &server,
        "/api/system-health",
        json!({"database": "online", "log_watcher": "stopped"}),
    )
    .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_snapshot_json_summary() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = mock_service().await;
    let home = tempdir().unwrap();

    let output = cargo_bin_cmd!("pamdash")
        .env("PAMDASH_HOME", home.path())
        .args(["snapshot", "--json", "--server", &server.uri()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["summary"]["totalAnomalies"], 3);
    assert_eq!(doc["summary"]["criticalAlerts"], 1);
    assert_eq!(doc["summary"]["activeSessions"], 1);
    let high_risk: Vec<u64> = doc["highRisk"]
        .as_array()
        .unwrap()
        .iter()
        .map(|alert| alert["riskScore"].as_u64().unwrap())
        .collect();
    assert_eq!(high_risk, vec![85, 97]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_snapshot_tables() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = mock_service().await;
    let home = tempdir().unwrap();

    cargo_bin_cmd!("pamdash")
        .env("PAMDASH_HOME", home.path())
        .env("PAMDASH_SERVER", server.uri())
        .arg("snapshot")
        .assert()
        .success()
        .stdout(predicate::str::contains("Critical (97)"))
        .stdout(predicate::str::contains("dba@company.com"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_lists_components() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = mock_service().await;
    let home = tempdir().unwrap();

    cargo_bin_cmd!("pamdash")
        .env("PAMDASH_HOME", home.path())
        .args(["health", "--server", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Database"))
        .stdout(predicate::str::contains("unhealthy"))
        .stdout(predicate::str::contains("CPU Usage"));
}

#[test]
fn test_snapshot_unreachable_server_fails() {
    let home = tempdir().unwrap();
    cargo_bin_cmd!("pamdash")
        .env("PAMDASH_HOME", home.path())
        .args(["snapshot", "--server", "http://127.0.0.1:9"])
        .assert()
        .failure();
}
