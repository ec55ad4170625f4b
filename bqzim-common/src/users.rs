//! User accounts
//!
//! Credential storage and verification on top of the `users` table.
//! Passwords are only ever stored hashed (see [`crate::password`]).

use crate::password::{self, HashedPassword};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tracing::debug;

/// Stored user, without credential columns
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub date_joined: NaiveDateTime,
}

/// Fields for a user about to be created
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    password_hash: String,
    password_salt: String,
    is_active: bool,
}

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, is_active, date_joined";

/// True if a user with exactly this username exists
pub async fn username_exists(db: &SqlitePool, username: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
        .bind(username)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// True if a user with exactly this email exists
pub async fn email_exists(db: &SqlitePool, email: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
        .bind(email)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// Load a user by id
pub async fn get_user(db: &SqlitePool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

/// Hash the password and insert a new user
///
/// A unique-constraint race (another signup committing the same username or
/// email between validation and insert) surfaces as [`Error::Duplicate`].
pub async fn create_user(db: &SqlitePool, new_user: NewUser) -> Result<User> {
    let NewUser {
        username,
        email,
        first_name,
        last_name,
        password,
    } = new_user;

    let HashedPassword { hash, salt } = run_blocking(move || password::hash_password(&password)).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, first_name, last_name, password_hash, password_salt)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&username)
    .bind(&email)
    .bind(&first_name)
    .bind(&last_name)
    .bind(&hash)
    .bind(&salt)
    .execute(db)
    .await
    .map_err(map_unique_violation)?;

    let id = result.last_insert_rowid();
    debug!("Created user {} (id {})", username, id);

    get_user(db, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("User {} vanished after insert", id)))
}

/// Verify a username/password pair
///
/// Returns `Ok(None)` for an unknown user, an inactive user, or a wrong
/// password; callers must not distinguish between these.
pub async fn authenticate(db: &SqlitePool, username: &str, password: &str) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, password_hash, password_salt, is_active FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(db)
    .await?;

    let password = password.to_string();
    let Some(row) = row else {
        run_blocking(move || password::dummy_verify(&password)).await?;
        return Ok(None);
    };

    let CredentialRow {
        id,
        password_hash,
        password_salt,
        is_active,
    } = row;

    let valid = run_blocking(move || {
        password::verify_password(&password, &password_hash, &password_salt)
    })
    .await?;

    if !valid || !is_active {
        return Ok(None);
    }

    get_user(db, id).await
}

/// Hashing is CPU-bound; keep it off the async worker threads
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))
}

fn map_unique_violation(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            if message.contains("users.username") {
                return Error::Duplicate {
                    field: "username".to_string(),
                };
            }
            if message.contains("users.email") {
                return Error::Duplicate {
                    field: "email".to_string(),
                };
            }
        }
    }
    Error::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::create_schema(&pool).await.unwrap();
        pool
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Tendai".to_string(),
            last_name: "Moyo".to_string(),
            password: "s3cret-pass".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_stores_hash_not_password() {
        let db = memory_db().await;
        let user = create_user(&db, new_user("tendai", "t@example.com")).await.unwrap();

        assert_eq!(user.username, "tendai");
        assert_eq!(user.email, "t@example.com");
        assert!(user.is_active);

        let (hash, salt): (String, String) =
            sqlx::query_as("SELECT password_hash, password_salt FROM users WHERE id = ?")
                .bind(user.id)
                .fetch_one(&db)
                .await
                .unwrap();
        assert_ne!(hash, "s3cret-pass");
        assert!(hash.starts_with("pbkdf2_sha256$"));
        assert!(!salt.is_empty());
    }

    #[tokio::test]
    async fn test_exists_checks() {
        let db = memory_db().await;
        create_user(&db, new_user("tendai", "t@example.com")).await.unwrap();

        assert!(username_exists(&db, "tendai").await.unwrap());
        assert!(!username_exists(&db, "rudo").await.unwrap());
        assert!(email_exists(&db, "t@example.com").await.unwrap());
        assert!(!email_exists(&db, "r@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_race_maps_to_duplicate() {
        let db = memory_db().await;
        create_user(&db, new_user("tendai", "t@example.com")).await.unwrap();

        let err = create_user(&db, new_user("tendai", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Duplicate { ref field } if field == "username"));

        let err = create_user(&db, new_user("rudo", "t@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Duplicate { ref field } if field == "email"));
    }

    #[tokio::test]
    async fn test_blank_emails_do_not_collide() {
        let db = memory_db().await;
        create_user(&db, new_user("first", "")).await.unwrap();
        create_user(&db, new_user("second", "")).await.unwrap();
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = memory_db().await;
        let created = create_user(&db, new_user("tendai", "")).await.unwrap();

        let ok = authenticate(&db, "tendai", "s3cret-pass").await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(created.id));

        assert!(authenticate(&db, "tendai", "wrong").await.unwrap().is_none());
        assert!(authenticate(&db, "nobody", "s3cret-pass").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_authenticate() {
        let db = memory_db().await;
        let created = create_user(&db, new_user("tendai", "")).await.unwrap();

        sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
            .bind(created.id)
            .execute(&db)
            .await
            .unwrap();

        assert!(authenticate(&db, "tendai", "s3cret-pass").await.unwrap().is_none());
    }
}
