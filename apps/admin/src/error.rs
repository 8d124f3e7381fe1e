//! # API Error Type
//!
//! Unified error type for admin commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Snack Manager                      │
//! │                                                                         │
//! │  UI                          Rust Backend                               │
//! │  ──                          ────────────                               │
//! │                                                                         │
//! │  invoke('record_sale')                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  No session / wrong role? ─── UNAUTHORIZED / FORBIDDEN ──┐       │  │
//! │  │         │                                                │       │  │
//! │  │         ▼                                                ▼       │  │
//! │  │  Domain rule? ─── CoreError::InsufficientStock ──────► ApiError ─►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database failure? ─── DbError::QueryFailed (logged, generic) ──►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  catch (e) {                                                            │
//! │    // e.code = "INSUFFICIENT_STOCK"                                     │
//! │    // e.message = "Insufficient stock for Doritos: only 5 units ..."    │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Domain messages reach the UI verbatim; they are written for the operator.
//! Infrastructure failures are logged with `error!` and replaced by a
//! generic message.

use serde::Serialize;
use snack_core::CoreError;
use snack_db::DbError;

/// API error returned from commands.
///
/// ```json
/// {
///   "code": "CONFLICT",
///   "message": "Cannot delete: This person has associated sales"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Snack, person, sale or debt does not exist
    NotFound,

    /// Input rejected before any write
    ValidationError,

    /// Not enough units to cover the sale
    InsufficientStock,

    /// State conflict: delete blocked, nothing pending, already paid
    Conflict,

    /// No session
    Unauthorized,

    /// Session lacks the admin role
    Forbidden,

    /// Database operation failed
    DatabaseError,

    /// Anything else
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized() -> Self {
        ApiError::new(ErrorCode::Unauthorized, "Sign in to continue")
    }

    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::Forbidden, "This action requires an admin")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            e if e.is_not_found() => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::DeleteBlocked { .. }
            | CoreError::NoPendingDebts(_)
            | CoreError::DebtAlreadyExists(_)
            | CoreError::DebtAlreadyPaid(_) => ErrorCode::Conflict,
            _ => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { entity, id } => {
                ApiError::new(ErrorCode::NotFound, format!("{entity} not found: {id}"))
            }
            DbError::UniqueViolation { field } => {
                ApiError::new(ErrorCode::Conflict, format!("Duplicate {field}"))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::Conflict, "Invalid reference")
            }
            DbError::Decode { column, value } => {
                tracing::error!(%column, %value, "Corrupt stored value");
                ApiError::internal("Stored data could not be read")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for commands.
pub type ApiResult<T> = Result<T, ApiError>;
