//! # stockroom-core: Pure Order and Inventory Logic
//!
//! Domain types and pure computations for the Stockroom back office. Nothing
//! in this crate performs I/O; transactions and locking live in
//! `stockroom-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockroom Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 External transport (HTTP, IPC, ...)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON payload + verified identity       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            stockroom-backoffice (operation surface)             │   │
//! │  │   commit_sale, create_quotation, restock, create_margin_range   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │ margin  │ │  order   │ │  auth  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  │                        validation                               │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            stockroom-db (SQLite, transactions, locks)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Quotation, Sale and their lines
//! - [`money`] - Integer cents and exact decimal parsing
//! - [`margin`] - Closed-closed margin bounds and the markup strategy
//! - [`order`] - Quotation pricing and sale aggregation
//! - [`auth`] - Identity and role checks
//! - [`validation`] - Boundary parsing of loosely typed payloads
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::margin::{MarginRange, MarkupStrategy, PercentageMarkup};
//! use stockroom_core::money::Money;
//!
//! let range = MarginRange { id: 1, min_cents: 0, max_cents: Some(10000), markup_bps: 1000 };
//! let sale = PercentageMarkup.sale_price(Money::from_cents(5000), &range).unwrap();
//! assert_eq!(sale.cents(), 5500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod margin;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::{authorize, Identity};
pub use error::{CoreError, CoreResult, ValidationError};
pub use margin::{MarginBounds, MarginRange, MarginRangeInput, MarkupRate, MarkupStrategy, PercentageMarkup};
pub use money::Money;
pub use order::{OrderItem, PricedLine, PricedOrder, PricedSale, SaleOrder};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of quotations returned by the list read, newest first.
pub const QUOTATION_LIST_LIMIT: i64 = 200;
