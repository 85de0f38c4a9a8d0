//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Transaction Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  repository method                                                     │
//! │       │                                                                 │
//! │       │  let mut tx = self.pool.begin().await?;                        │
//! │       ▼                                                                 │
//! │  first statement is a WRITE (lock touch / header insert / range write) │
//! │       │                                                                 │
//! │       │  helpers take `&mut SqliteConnection` = `&mut *tx`            │
//! │       ▼                                                                 │
//! │  any `?` → tx dropped → ROLLBACK        success → tx.commit()          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Helpers never reach back to the pool while a transaction is open; an
//! in-memory database has exactly one connection.
//!
//! ## Lock Order
//! Every operation that locks more than one product goes through
//! [`product::lock_products`], which touches rows in ascending id order.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog accessor
//! - [`UserRepository`](user::UserRepository) - Seller identity
//! - [`MarginRangeRepository`](margin::MarginRangeRepository) - Margin ranges and price resolution
//! - [`QuotationRepository`](quotation::QuotationRepository) - Draft orders
//! - [`SaleRepository`](sale::SaleRepository) - Binding sale commit
//! - [`RestockRepository`](restock::RestockRepository) - Batch restock

pub mod margin;
pub mod product;
pub mod quotation;
pub mod restock;
pub mod sale;
pub mod user;
