//! # Restock Command

use serde_json::Value;
use stockroom_core::auth::ADMIN_ONLY;
use stockroom_core::validation::parse_restock_batch;
use stockroom_core::{authorize, Identity, RestockOutcome};
use stockroom_db::Database;
use tracing::debug;

use crate::error::ApiError;

/// Applies a restock batch. Admin only.
///
/// ## Payload
/// ```json
/// [{ "product_id": 3, "quantity_delta": 12, "purchase_price": "4.10", "sale_price": "6.50" }]
/// ```
/// `{ "entries": [...] }` is accepted too. Every entry is validated before
/// the batch transaction opens; one bad entry rejects all of them.
///
/// Not idempotent: submitting the same batch twice adds its deltas twice.
pub async fn restock(
    db: &Database,
    identity: Option<&Identity>,
    payload: &Value,
) -> Result<RestockOutcome, ApiError> {
    let caller = authorize(identity, ADMIN_ONLY, "restock")?;

    let entries = parse_restock_batch(payload)?;
    debug!(user_id = caller.user_id, entries = entries.len(), "restock command");

    Ok(db.restocks().apply(&entries).await?)
}
