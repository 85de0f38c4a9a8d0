//! # Backoffice Commands
//!
//! One async function per operation exposed to the transport layer.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── quotation.rs  ◄─── create/update/get/list/delete quotations
//! ├── sale.rs       ◄─── commit_sale, get_sale, list_sales
//! ├── restock.rs    ◄─── restock
//! └── margin.rs     ◄─── margin range table, sale price resolution
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  Transport (HTTP handler, IPC, ...)                                     │
//! │  ──────────────────────────────────                                     │
//! │  identity = auth_collaborator.verify(request)   ◄── never done here    │
//! │  body     = serde_json::from_slice(request.body)                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  async fn commit_sale(                                                  │
//! │      db: &Database,                ◄── shared pool handle               │
//! │      identity: Option<&Identity>,  ◄── verified (user_id, role)        │
//! │      payload: &Value,              ◄── loosely typed body               │
//! │  ) -> Result<SaleReceipt, ApiError>                                     │
//! │         │                                                               │
//! │         │  1. authorize(identity, roles)                                │
//! │         │  2. parse + validate payload (no transaction yet)            │
//! │         │  3. repository call (one transaction)                        │
//! │         ▼                                                               │
//! │  Transport serialises Ok(T) or Err(ApiError {kind, message, context})  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod margin;
pub mod quotation;
pub mod restock;
pub mod sale;
