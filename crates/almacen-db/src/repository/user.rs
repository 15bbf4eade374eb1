//! # User Repository
//!
//! Database operations for users. The password column is stored as given.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::generate_id;
use crate::repository::{begin_write, count_referencing};
use almacen_core::{NewUser, User};

const SELECT_USER: &str = "SELECT id, name, email, password, image_path FROM users";

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

    /// Inserts a new user.
    pub async fn create(&self, new: &NewUser) -> DbResult<User> {
        new.validate()?;

        let user = User {
            id: generate_id(),
            name: new.name.clone(),
            email: new.email.trim().to_string(),
            password: new.password.clone(),
            image_path: new.image_path.clone(),
        };

        debug!(id = %user.id, name = %user.name, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, name, email, password, image_path) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.image_path)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE id = ?1", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Lists all users ordered by name.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{} ORDER BY name, id", SELECT_USER))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Updates name, email, password and image path.
    pub async fn update(&self, user: &User) -> DbResult<()> {
        user.validate()?;

        debug!(id = %user.id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?2, email = ?3, password = ?4, image_path = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(user.email.trim())
        .bind(&user.password)
        .bind(&user.image_path)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", &user.id));
        }

        Ok(())
    }

    /// Deletes a user and returns the removed row.
    /// Refused while the user has logged transactions.
    pub async fn delete(&self, id: &str) -> DbResult<User> {
        debug!(id = %id, "Deleting user");

        let mut tx = begin_write(&self.pool).await?;

        let user = sqlx::query_as::<_, User>(&format!("{} WHERE id = ?1", SELECT_USER))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        if count_referencing(&mut *tx, "transactions", "user_id", id).await? > 0 {
            return Err(DbError::protected("User", id, "transactions"));
        }

        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
