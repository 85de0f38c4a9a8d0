//! # API Error Type
//!
//! Unified error type for backoffice commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockroom                              │
//! │                                                                         │
//! │  Transport                   Rust Backend                               │
//! │  ─────────                   ────────────                               │
//! │                                                                         │
//! │  commit_sale(payload)                                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Role check?  ──── CoreError::Forbidden ──────────┐              │  │
//! │  │         │                                         │              │  │
//! │  │         ▼                                         ▼              │  │
//! │  │  Payload parse? ── ValidationError ────────────► ApiError ──────►│  │
//! │  │         │                                         ▲              │  │
//! │  │         ▼                                         │              │  │
//! │  │  Transaction? ──── DbError::Domain(Insufficient…) ┘              │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "kind": "CONFLICT",                                                 │
//! │    "message": "Insufficient stock for Hammer: available 3, ...",       │
//! │    "context": { "product_id": 7, "available": 3, "requested": 5 } }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged in full and reach the caller only as a
//! generic message.

use serde::Serialize;
use serde_json::{json, Value};
use stockroom_core::{CoreError, ValidationError};
use stockroom_db::DbError;
use tracing::{error, warn};

/// API error returned from backoffice commands.
///
/// ## Serialization
/// ```json
/// {
///   "kind": "NOT_FOUND",
///   "message": "Product not found: 42",
///   "context": { "product_id": 42 }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error category
    pub kind: ErrorKind,

    /// Human-readable error message
    pub message: String,

    /// Offending ids and quantities; always a JSON object
    pub context: Value,
}

/// Error categories surfaced to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing input, caught before any transaction
    ValidationError,

    /// Referenced product, quotation, sale or range is absent
    NotFound,

    /// Inactive product, short stock, overlapping range, duplicate key
    Conflict,

    /// Missing or insufficient identity
    AuthError,

    /// Persistence-layer failure
    InternalError,
}

impl ApiError {
    /// Creates a new API error with an empty context.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ApiError {
            kind,
            message: message.into(),
            context: json!({}),
        }
    }

    /// Attaches a context object.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Creates an internal error with a generic message.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorKind::InternalError, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Converts validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let context = match &err {
            ValidationError::Required { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => json!({ "field": field }),
            ValidationError::TooLong { field, max } => json!({ "field": field, "max": max }),
            ValidationError::OutOfRange { field, min, max } => {
                json!({ "field": field, "min": min, "max": max })
            }
            ValidationError::InvalidRange { min, max } => json!({ "min": min, "max": max }),
        };
        ApiError::new(ErrorKind::ValidationError, err.to_string()).with_context(context)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let (kind, context) = match err {
            CoreError::Validation(e) => return e.into(),
            CoreError::ProductNotFound(id) => (ErrorKind::NotFound, json!({ "product_id": id })),
            CoreError::ProductInactive { product_id, .. } => {
                (ErrorKind::Conflict, json!({ "product_id": product_id }))
            }
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            } => (
                ErrorKind::Conflict,
                json!({
                    "product_id": product_id,
                    "available": available,
                    "requested": requested,
                }),
            ),
            CoreError::StockOverflow {
                product_id,
                stock_qty,
                delta,
                ..
            } => (
                ErrorKind::Conflict,
                json!({
                    "product_id": product_id,
                    "stock_qty": stock_qty,
                    "delta": delta,
                }),
            ),
            CoreError::MarginRangeOverlap {
                min_cents,
                max_cents,
                conflicting_id,
            } => (
                ErrorKind::Conflict,
                json!({
                    "min_cents": min_cents,
                    "max_cents": max_cents,
                    "conflicting_id": conflicting_id,
                }),
            ),
            CoreError::NoMarginRange {
                purchase_price_cents,
            } => (
                ErrorKind::NotFound,
                json!({ "purchase_price_cents": purchase_price_cents }),
            ),
            CoreError::MarginRangeNotFound(id) => {
                (ErrorKind::NotFound, json!({ "margin_range_id": id }))
            }
            CoreError::QuotationNotFound(id) => {
                (ErrorKind::NotFound, json!({ "quotation_id": id }))
            }
            CoreError::SaleNotFound(id) => (ErrorKind::NotFound, json!({ "sale_id": id })),
            CoreError::UserNotFound(id) => (ErrorKind::NotFound, json!({ "user_id": id })),
            CoreError::Unauthenticated => (ErrorKind::AuthError, json!({})),
            CoreError::Forbidden { role, operation } => (
                ErrorKind::AuthError,
                json!({ "role": role, "operation": operation }),
            ),
        };
        ApiError::new(kind, message).with_context(context)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorKind::Conflict,
                format!("{} '{}' already exists", field, value),
            )
            .with_context(json!({ "field": field })),
            DbError::ForeignKeyViolation { message } => {
                warn!("Foreign key violation: {}", message);
                ApiError::new(ErrorKind::NotFound, "Referenced record does not exist")
            }
            DbError::CheckViolation { message } => {
                warn!("Check constraint violated: {}", message);
                ApiError::new(ErrorKind::Conflict, "Operation violates a stock constraint")
            }
            DbError::LockTimeout => {
                warn!("Gave up waiting for the database lock");
                ApiError::internal("Timed out waiting for a database lock")
            }
            DbError::PoolExhausted => ApiError::internal("Database pool exhausted"),
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::internal("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::internal("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::internal("Database operation failed")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::internal("Database operation failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_is_conflict_with_quantities() {
        let err: ApiError = DbError::Domain(CoreError::InsufficientStock {
            product_id: 7,
            description: "Hammer".to_string(),
            available: 3,
            requested: 5,
        })
        .into();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.context["product_id"], 7);
        assert_eq!(err.context["available"], 3);
        assert_eq!(err.context["requested"], 5);
    }

    #[test]
    fn test_validation_carries_field() {
        let err: ApiError = CoreError::Validation(ValidationError::required("items")).into();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert_eq!(err.context["field"], "items");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: ApiError = DbError::QueryFailed("no such column: secret".to_string()).into();
        assert_eq!(err.kind, ErrorKind::InternalError);
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_serialized_shape() {
        let err: ApiError = CoreError::ProductNotFound(42).into();
        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["kind"], "NOT_FOUND");
        assert_eq!(body["message"], "Product not found: 42");
        assert_eq!(body["context"]["product_id"], 42);
    }

    #[test]
    fn test_stock_overflow_is_conflict_with_product() {
        let err: ApiError = DbError::Domain(CoreError::StockOverflow {
            product_id: 3,
            description: "Nails".to_string(),
            stock_qty: i64::MAX - 1,
            delta: 5,
        })
        .into();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.context["product_id"], 3);
        assert_eq!(err.context["delta"], 5);
    }

    #[test]
    fn test_auth_errors() {
        let err: ApiError = CoreError::Unauthenticated.into();
        assert_eq!(err.kind, ErrorKind::AuthError);

        let err: ApiError = CoreError::Forbidden {
            role: "viewer".to_string(),
            operation: "restock".to_string(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::AuthError);
        assert_eq!(err.context["operation"], "restock");
    }
}
