//! # Domain Types
//!
//! Core domain records used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   Quotation     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  code (unique)  │   │  client?        │   │  created_at     │       │
//! │  │  stock_qty ≥ 0  │   │  total_cents    │   │  total_cents    │       │
//! │  │  sale_price     │   │  seller_id      │   │  seller_id      │       │
//! │  └─────────────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │                                 │ owns                │ owns            │
//! │                        ┌────────▼────────┐   ┌────────▼────────┐       │
//! │                        │ QuotationLine   │   │    SaleLine     │       │
//! │                        │ price snapshot  │   │ price @ commit  │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines reference products by id only. A product that no longer exists reads
//! back as `None` in the joined views instead of failing the read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Business code, unique among active products.
    pub code: String,

    /// Barcode (EAN-13, UPC-A, etc.), unique when present.
    pub barcode: Option<String>,

    /// Display name shown on quotations and receipts.
    pub description: String,

    /// Shelf or bin location.
    pub location: Option<String>,

    pub stock_max: i64,
    pub stock_min: i64,

    /// Units on hand. Never negative.
    pub stock_qty: i64,

    pub purchase_price_cents: i64,
    pub sale_price_cents: i64,

    pub supplier_id: Option<i64>,
    pub category_id: Option<i64>,

    /// Inactive products cannot be sold or restocked.
    pub is_active: bool,

    pub image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Checks if the requested quantity can be taken from stock.
    pub fn can_fulfil(&self, quantity: i64) -> bool {
        self.stock_qty >= quantity
    }
}

/// Catalog write payload for a new product.
///
/// `sale_price_cents = None` means "derive from the margin range table".
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub code: String,
    pub barcode: Option<String>,
    pub description: String,
    pub location: Option<String>,
    pub stock_max: i64,
    pub stock_min: i64,
    pub stock_qty: i64,
    pub purchase_price_cents: i64,
    pub sale_price_cents: Option<i64>,
    pub supplier_id: Option<i64>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
}

// =============================================================================
// Identity
// =============================================================================

/// Role handed over by the external authorization collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Sales,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Sales => "sales",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "sales" | "seller" => Ok(Role::Sales),
            "viewer" => Ok(Role::Viewer),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".into(), "sales".into(), "viewer".into()],
            }),
        }
    }
}

/// A seller / staff account. Only what headers need to join against.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    /// Store credit / account.
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Credit => "credit",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit_card" | "debit" | "debit_card" => Ok(PaymentMethod::Card),
            "transfer" | "bank_transfer" => Ok(PaymentMethod::Transfer),
            "credit" | "account" => Ok(PaymentMethod::Credit),
            "" => Err(ValidationError::required("payment_method")),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec![
                    "cash".into(),
                    "card".into(),
                    "transfer".into(),
                    "credit".into(),
                ],
            }),
        }
    }
}

// =============================================================================
// Quotation
// =============================================================================

/// Quotation header (draft, non-binding order).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Quotation {
    pub id: i64,
    pub client: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub total_cents: i64,
    pub seller_id: i64,
    /// Seller display name, joined at read time.
    pub seller_name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Quotation {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A stored quotation line, frozen at computation time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct QuotationLine {
    pub product_id: i64,
    pub description_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
    /// Current catalog stock, informational only. `None` if the product is gone.
    pub current_stock: Option<i64>,
}

/// Header plus lines, as returned by the detail read.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuotationDetail {
    pub quotation: Quotation,
    pub lines: Vec<QuotationLine>,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed, immutable sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub seller_id: i64,
    pub seller_name: Option<String>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A sale line. `unit_price_cents` is the price read under lock at commit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLine {
    pub product_id: i64,
    /// Current catalog description. `None` if the product is gone.
    pub description: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

impl SaleLine {
    /// `None` only if the stored line does not fit in cents.
    pub fn subtotal(&self) -> Option<Money> {
        Money::from_cents(self.unit_price_cents).checked_mul_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

/// Receipt-ready line returned by a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub product_id: i64,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

/// Result of a committed sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleReceipt {
    pub sale_id: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub lines: Vec<ReceiptLine>,
}

// =============================================================================
// Restock
// =============================================================================

/// Result of an applied restock batch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RestockOutcome {
    /// Number of distinct products updated.
    pub updated: usize,
    /// Post-update snapshots, ascending by product id.
    pub products: Vec<Product>,
}

// =============================================================================
// Unit Tests
// =============================================================================
