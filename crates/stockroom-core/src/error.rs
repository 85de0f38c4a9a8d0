//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  backoffice errors (in app)                                            │
//! │  └── ApiError         - What the transport sees {kind, message, ctx}   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Transport    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant carries the ids and quantities needed to build a structured
/// error context for the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced product does not exist.
    ///
    /// ## When This Occurs
    /// - Quotation payload references an unknown id
    /// - Sale request references an id that vanished before the lock
    /// - Restock entry references an unknown id
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Product exists but has been deactivated.
    #[error("Product {product_id} ({description}) is inactive")]
    ProductInactive {
        product_id: i64,
        description: String,
    },

    /// Insufficient stock to complete sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Commit sale (qty: 5)
    ///      │
    ///      ▼
    /// Locked read: stock_qty=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 7, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, nothing written
    /// ```
    #[error("Insufficient stock for {description}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        description: String,
        available: i64,
        requested: i64,
    },

    /// Restock deltas would push stock past what a stock count can hold.
    #[error("Restocking {description} by {delta} overflows its stock of {stock_qty}")]
    StockOverflow {
        product_id: i64,
        description: String,
        stock_qty: i64,
        delta: i64,
    },

    /// Candidate margin range intersects an existing one (closed-closed).
    #[error("Margin range [{min_cents}, {}] overlaps range {conflicting_id}", fmt_max(.max_cents))]
    MarginRangeOverlap {
        min_cents: i64,
        max_cents: Option<i64>,
        conflicting_id: i64,
    },

    /// No configured margin range covers the purchase price.
    #[error("No margin range covers purchase price {purchase_price_cents}")]
    NoMarginRange { purchase_price_cents: i64 },

    #[error("Margin range not found: {0}")]
    MarginRangeNotFound(i64),

    #[error("Quotation not found: {0}")]
    QuotationNotFound(i64),

    #[error("Sale not found: {0}")]
    SaleNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// No identity was handed over by the authorization collaborator.
    #[error("Authentication required")]
    Unauthenticated,

    /// Identity present, role not allowed for the operation.
    #[error("Role {role} is not allowed to {operation}")]
    Forbidden { role: String, operation: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn fmt_max(max: &Option<i64>) -> String {
    match max {
        Some(value) => value.to_string(),
        None => "∞".to_string(),
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised by the parse-and-validate step at the component boundary, before
/// any transaction is opened.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., "abc" where a quantity was expected).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Interval with min above max.
    #[error("range min {min} is greater than max {max}")]
    InvalidRange { min: i64, max: i64 },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
