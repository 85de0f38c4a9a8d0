//! # User Repository
//!
//! Minimal seller identity store. Quotation and sale headers carry a seller
//! id that must reference a row here, and reads join the seller's name.

use chrono::Utc;
use sqlx::SqlitePool;
use stockroom_core::validation::ValidationResult;
use stockroom_core::{Role, User, ValidationError};
use tracing::info;

use crate::error::DbResult;

/// Repository for seller accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user and returns it with its generated id.
    pub async fn insert(&self, name: &str, role: Role) -> DbResult<User> {
        let name = validate_name(name)?;

        let id = sqlx::query("INSERT INTO users (name, role, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(role)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        info!(id, role = %role, "User created");
        Ok(User {
            id,
            name: name.to_string(),
            role,
        })
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, role FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

fn validate_name(name: &str) -> ValidationResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }
    Ok(name)
}
