//! # Service Error Type
//!
//! Unified error type for every service operation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Almacen                                │
//! │                                                                         │
//! │  Service operation: Result<T, ServiceError>                             │
//! │         │                                                               │
//! │         ├── ValidationError ──────────────────► VALIDATION_ERROR        │
//! │         │                                                               │
//! │         ├── DbError::NotFound ────────────────► NOT_FOUND               │
//! │         ├── DbError::ReferentialIntegrity ────► REFERENTIAL_INTEGRITY   │
//! │         ├── DbError::Reference ───────────────► REFERENCE_ERROR         │
//! │         ├── DbError::Concurrency ─────────────► CONCURRENCY             │
//! │         ├── DbError::(anything else) ─────────► DATABASE_ERROR          │
//! │         │                                                               │
//! │         ├── MediaError ───────────────────────► MEDIA_ERROR             │
//! │         │                                                               │
//! │         └── blocking task panicked ───────────► INTERNAL                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers match on `code`; `message` is for display and logs.

use almacen_core::ValidationError;
use almacen_db::DbError;
use almacen_media::MediaError;
use serde::Serialize;
use tokio::task::JoinError;

/// Error returned from service operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "REFERENTIAL_INTEGRITY",
///   "message": "Category 3f0c... is still referenced by products"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Entity does not exist
    NotFound,

    /// Field rules, duplicates, CHECK constraints
    ValidationError,

    /// Delete blocked by dependent rows
    ReferentialIntegrity,

    /// Write points at a missing row
    ReferenceError,

    /// Database busy or locked
    Concurrency,

    /// Blob storage or image processing failed
    MediaError,

    /// Connection, migration or query failure
    DatabaseError,

    Internal,
}

impl ServiceError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ServiceError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::not_found(&entity, &id),
            DbError::Validation(e) => ServiceError::validation(e.to_string()),
            e @ DbError::ReferentialIntegrity { .. } => {
                ServiceError::new(ErrorCode::ReferentialIntegrity, e.to_string())
            }
            e @ DbError::Reference { .. } => {
                ServiceError::new(ErrorCode::ReferenceError, e.to_string())
            }
            DbError::Concurrency(msg) => {
                tracing::warn!("Write conflict: {}", msg);
                ServiceError::new(ErrorCode::Concurrency, "Database is busy, retry the operation")
            }
            other => {
                // Log full detail, return a generic message
                tracing::error!("Database error: {}", other);
                ServiceError::new(ErrorCode::DatabaseError, "A database error occurred")
            }
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::validation(err.to_string())
    }
}

impl From<MediaError> for ServiceError {
    fn from(err: MediaError) -> Self {
        match &err {
            MediaError::Io(e) => tracing::error!("Media I/O error: {}", e),
            other => tracing::warn!("Media error: {}", other),
        }
        ServiceError::new(ErrorCode::MediaError, err.to_string())
    }
}

impl From<JoinError> for ServiceError {
    fn from(err: JoinError) -> Self {
        tracing::error!("Blocking task failed: {}", err);
        ServiceError::internal("Background task failed")
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_codes() {
        let cases = [
            (DbError::not_found("Product", "p-1"), ErrorCode::NotFound),
            (DbError::duplicate("tag_id", "04:A1"), ErrorCode::ValidationError),
            (
                DbError::protected("Category", "c-1", "products"),
                ErrorCode::ReferentialIntegrity,
            ),
            (DbError::reference("Product", "p-9"), ErrorCode::ReferenceError),
            (DbError::Concurrency("locked".into()), ErrorCode::Concurrency),
            (DbError::PoolExhausted, ErrorCode::DatabaseError),
        ];

        for (db, code) in cases {
            assert_eq!(ServiceError::from(db).code, code);
        }
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = ServiceError::from(DbError::QueryFailed("near \"SELEC\": syntax error".into()));
        assert_eq!(err.message, "A database error occurred");
    }

    #[test]
    fn test_serialized_shape() {
        let err = ServiceError::not_found("Product", "p-1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: p-1");

        let json = serde_json::to_value(ServiceError::from(MediaError::NotFound("x".into()))).unwrap();
        assert_eq!(json["code"], "MEDIA_ERROR");
    }

    #[test]
    fn test_display() {
        let err = ServiceError::validation("name is required");
        assert_eq!(err.to_string(), "[ValidationError] name is required");
    }
}
