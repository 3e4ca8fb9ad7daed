//! Integration tests for slip-queue stats command

use assert_cmd::Command;
use libslipstream::service::events::EventBus;
use libslipstream::service::queue::QueueService;
use libslipstream::storage::{SqliteStorage, StorageBackend};
use libslipstream::types::{ActionKind, QueuedAction};
use predicates::prelude::*;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Helper to create a test environment with config and database
fn setup_test_env() -> (TempDir, String, String) {
    let temp_dir = TempDir::new().unwrap();

    // Create config directory
    let config_dir = temp_dir.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // Create data directory
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // Create config file
    let config_path = config_dir.join("config.toml");
    let db_path = data_dir.join("actions.db");

    let config_content = format!(
        r#"
[database]
path = "{}"

[queue]
namespace = "test"
"#,
        escape_path_for_toml(&db_path.to_string_lossy())
    );

    fs::write(&config_path, config_content).unwrap();

    (
        temp_dir,
        config_path.to_string_lossy().to_string(),
        db_path.to_string_lossy().to_string(),
    )
}

/// Helper to enqueue actions through the library
async fn seed_actions(db_path: &str, specs: &[(ActionKind, serde_json::Value)]) -> Vec<String> {
    let storage = Arc::new(SqliteStorage::new(db_path).await.unwrap());
    let queue = QueueService::new(
        Arc::clone(&storage) as Arc<dyn StorageBackend>,
        "test",
        EventBus::new(16),
    );

    let mut ids = Vec::new();
    for (kind, payload) in specs {
        ids.push(queue.enqueue(*kind, payload.clone()).await.id);
    }

    storage.close().await;
    ids
}

/// Helper to write a snapshot with explicit attempt counts
async fn seed_snapshot(db_path: &str, specs: &[(ActionKind, u32)]) {
    let storage = Arc::new(SqliteStorage::new(db_path).await.unwrap());

    let actions: Vec<QueuedAction> = specs
        .iter()
        .map(|(kind, attempts)| {
            let mut action = QueuedAction::new(*kind, serde_json::json!({}));
            action.attempts = *attempts;
            action
        })
        .collect();

    storage
        .write("test:actions:v1", &serde_json::to_string(&actions).unwrap())
        .await
        .unwrap();
    storage.close().await;
}

// BASIC STATS TESTS

#[tokio::test]
async fn test_stats_empty_queue() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    let mut cmd = Command::cargo_bin("slip-queue").unwrap();

    cmd.env("SLIPSTREAM_CONFIG", &config_path)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending actions: 0"));
}

#[tokio::test]
async fn test_stats_shows_total_count() {
    let (_temp_dir, config_path, db_path) = setup_test_env();
    seed_actions(
        &db_path,
        &[
            (ActionKind::Like, serde_json::json!({"thread_id": "t1"})),
            (ActionKind::Like, serde_json::json!({"thread_id": "t2"})),
            (ActionKind::Comment, serde_json::json!({"thread_id": "t3"})),
        ],
    )
    .await;

    let mut cmd = Command::cargo_bin("slip-queue").unwrap();

    cmd.env("SLIPSTREAM_CONFIG", &config_path)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pending actions: 3"));
}

#[tokio::test]
async fn test_stats_counts_by_kind() {
    let (_temp_dir, config_path, db_path) = setup_test_env();
    seed_actions(
        &db_path,
        &[
            (ActionKind::Like, serde_json::json!({"thread_id": "t1"})),
            (ActionKind::Like, serde_json::json!({"thread_id": "t2"})),
            (ActionKind::Comment, serde_json::json!({"thread_id": "t3"})),
        ],
    )
    .await;

    let mut cmd = Command::cargo_bin("slip-queue").unwrap();

    cmd.env("SLIPSTREAM_CONFIG", &config_path)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("like: 2"))
        .stdout(predicate::str::contains("comment: 1"))
        // Kinds with no pending actions are omitted
        .stdout(predicate::str::contains("bookmark").not());
}

#[tokio::test]
async fn test_stats_shows_oldest_age() {
    let (_temp_dir, config_path, db_path) = setup_test_env();
    seed_actions(
        &db_path,
        &[(ActionKind::Like, serde_json::json!({"thread_id": "t1"}))],
    )
    .await;

    let mut cmd = Command::cargo_bin("slip-queue").unwrap();

    cmd.env("SLIPSTREAM_CONFIG", &config_path)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Oldest: just now"));
}

#[tokio::test]
async fn test_stats_shows_attempts_breakdown() {
    let (_temp_dir, config_path, db_path) = setup_test_env();
    seed_snapshot(
        &db_path,
        &[
            (ActionKind::Like, 0),
            (ActionKind::Like, 1),
            (ActionKind::Comment, 1),
            (ActionKind::Bookmark, 2),
        ],
    )
    .await;

    let mut cmd = Command::cargo_bin("slip-queue").unwrap();

    cmd.env("SLIPSTREAM_CONFIG", &config_path)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 failed attempts: 1"))
        .stdout(predicate::str::contains("1 failed attempt: 2"))
        .stdout(predicate::str::contains("2 failed attempts: 1"));
}

// JSON FORMAT TESTS

#[tokio::test]
async fn test_stats_json_format() {
    let (_temp_dir, config_path, db_path) = setup_test_env();
    seed_actions(
        &db_path,
        &[
            (ActionKind::Like, serde_json::json!({"thread_id": "t1"})),
            (ActionKind::Like, serde_json::json!({"thread_id": "t2"})),
            (ActionKind::Comment, serde_json::json!({"thread_id": "t3"})),
        ],
    )
    .await;

    let mut cmd = Command::cargo_bin("slip-queue").unwrap();

    cmd.env("SLIPSTREAM_CONFIG", &config_path)
        .arg("stats")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pending\": 3"))
        .stdout(predicate::str::contains("\"like\": 2"))
        .stdout(predicate::str::contains("\"comment\": 1"))
        .stdout(predicate::str::contains("\"by_attempts\""))
        .stdout(predicate::str::contains("\"oldest_enqueued_at\""));
}

#[tokio::test]
async fn test_stats_json_attempts_breakdown() {
    let (_temp_dir, config_path, db_path) = setup_test_env();
    seed_snapshot(
        &db_path,
        &[
            (ActionKind::Like, 0),
            (ActionKind::Like, 1),
            (ActionKind::Comment, 1),
        ],
    )
    .await;

    let mut cmd = Command::cargo_bin("slip-queue").unwrap();

    // Every attempt bucket below the cap appears, even when empty
    cmd.env("SLIPSTREAM_CONFIG", &config_path)
        .arg("stats")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"0\": 1"))
        .stdout(predicate::str::contains("\"1\": 2"))
        .stdout(predicate::str::contains("\"2\": 0"));
}

#[tokio::test]
async fn test_stats_json_format_empty() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    let mut cmd = Command::cargo_bin("slip-queue").unwrap();

    cmd.env("SLIPSTREAM_CONFIG", &config_path)
        .arg("stats")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pending\": 0"))
        .stdout(predicate::str::contains("\"oldest_enqueued_at\": null"));
}

// ERROR HANDLING TESTS

#[tokio::test]
async fn test_stats_invalid_format() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    let mut cmd = Command::cargo_bin("slip-queue").unwrap();

    cmd.env("SLIPSTREAM_CONFIG", &config_path)
        .arg("stats")
        .arg("--format")
        .arg("invalid")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Invalid format"));
}
