//! Tests for database initialization

use bqzim_common::db::init::{init_database, SCHEMA_VERSION};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sub").join("bqzim.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("bqzim.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    // Second open re-runs the idempotent schema
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_schema_version_recorded_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("bqzim.db");

    init_database(&db_path).await.unwrap();
    let pool = init_database(&db_path).await.unwrap();

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(versions, vec![SCHEMA_VERSION]);
}

#[tokio::test]
async fn test_users_table_columns() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("bqzim.db")).await.unwrap();

    let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('users')")
        .fetch_all(&pool)
        .await
        .unwrap();

    for expected in [
        "id",
        "username",
        "email",
        "first_name",
        "last_name",
        "password_hash",
        "password_salt",
        "is_active",
        "date_joined",
    ] {
        assert!(columns.iter().any(|c| c == expected), "missing column {}", expected);
    }
}
