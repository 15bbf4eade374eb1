//! # Storage Errors
//!
//! SQLite reports constraint failures as message text. [`DbError`] turns them
//! into outcomes a caller can act on:
//!
//! ```text
//!   delete category with products   → ReferentialIntegrity (checked first)
//!   product.category_id = "missing" → Reference
//!   nfc tag_id "04:A3" twice        → Validation(Duplicate)
//!   quantity = 0 past the checks    → Validation(InvalidFormat) via CHECK
//!   second writer past busy timeout → Concurrency
//! ```

use almacen_core::ValidationError;
use thiserror::Error;

/// Why a storage call failed.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row with that id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Field rules, UNIQUE indexes and CHECK constraints.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Protected delete: categories with products, products with movements
    /// or sales, users with sales.
    #[error("{entity} {id} is still referenced by {dependent}")]
    ReferentialIntegrity {
        entity: String,
        id: String,
        dependent: String,
    },

    /// A foreign key names a row that does not exist.
    #[error("Referenced {entity} does not exist: {id}")]
    Reference { entity: String, id: String },

    #[error("Concurrent write conflict: {0}")]
    Concurrency(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other SQLite error message.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No connection freed up within the connect timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn reference(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Reference {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// `entity` `id` cannot go while `dependent` rows point at it.
    pub fn protected(
        entity: impl Into<String>,
        id: impl Into<String>,
        dependent: impl Into<String>,
    ) -> Self {
        DbError::ReferentialIntegrity {
            entity: entity.into(),
            id: id.into(),
            dependent: dependent.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::Validation(ValidationError::duplicate(field, value))
    }

    /// Fills in the offending value of a UNIQUE failure on `field`.
    /// SQLite only names the column.
    pub fn with_duplicate_value(self, field: &str, value: &str) -> Self {
        match self {
            DbError::Validation(ValidationError::Duplicate { field: f, .. }) if f == field => {
                DbError::duplicate(field, value)
            }
            other => other,
        }
    }
}

/// Classifies SQLite failures.
///
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// UNIQUE constraint failed    → DbError::Validation(Duplicate)
/// FOREIGN KEY constraint      → DbError::Reference
/// CHECK constraint failed     → DbError::Validation(InvalidFormat)
/// database is locked / busy   → DbError::Concurrency
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: nfc_tags.tag_id"
                if let Some(target) = msg.split("UNIQUE constraint failed: ").nth(1) {
                    let field = target.rsplit('.').next().unwrap_or(target);
                    DbError::duplicate(field, "unknown")
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::reference("Record", "unknown")
                } else if let Some(expr) = msg.split("CHECK constraint failed: ").nth(1) {
                    DbError::Validation(ValidationError::invalid_format(
                        expr.trim(),
                        "violates a schema constraint",
                    ))
                } else if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::Concurrency(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_value_is_filled_in() {
        let err = DbError::duplicate("tag_id", "unknown").with_duplicate_value("tag_id", "04:A3");
        match err {
            DbError::Validation(ValidationError::Duplicate { field, value }) => {
                assert_eq!(field, "tag_id");
                assert_eq!(value, "04:A3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = DbError::not_found("Product", "x").with_duplicate_value("tag_id", "04:A3");
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_messages() {
        let err = DbError::protected("Category", "c-1", "products");
        assert_eq!(err.to_string(), "Category c-1 is still referenced by products");

        let err = DbError::reference("Product", "p-9");
        assert_eq!(err.to_string(), "Referenced Product does not exist: p-9");
    }
}
