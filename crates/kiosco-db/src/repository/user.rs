//! # User Repository
//!
//! The user directory: resolves acting users by name.
//!
//! The sale path trusts the identity it is given (authorization happens
//! upstream); this repository only answers "who is this username".

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kiosco_core::User;

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";

/// Resolves a user by username on the caller's connection.
///
/// Used inside the checkout transaction.
pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> DbResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(username)
        .fetch_optional(conn)
        .await?;

    Ok(user)
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Finds a user by username.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        find_by_username(&mut *conn, username).await
    }

    /// Inserts a new user.
    ///
    /// `password_hash` is stored as-is; hashing happens upstream.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username already exists
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(username = %user.username, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Helper to generate a new user ID.
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}
