//! # Quotation Commands
//!
//! Quotations are priced drafts. Writing one never touches stock.

use serde_json::Value;
use stockroom_core::auth::{ANY_ROLE, SELLING_ROLES};
use stockroom_core::validation::parse_quotation_payload;
use stockroom_core::{authorize, CoreError, Identity, Quotation, QuotationDetail};
use stockroom_db::Database;
use tracing::debug;

use crate::error::ApiError;

/// Creates a quotation owned by the caller.
///
/// ## Payload
/// ```json
/// { "client": "ACME", "payment_method": "card",
///   "items": [{ "product_id": 3, "quantity": 2 }] }
/// ```
/// A missing or sub-1 quantity is read as 1.
pub async fn create_quotation(
    db: &Database,
    identity: Option<&Identity>,
    payload: &Value,
) -> Result<QuotationDetail, ApiError> {
    let caller = authorize(identity, SELLING_ROLES, "create quotations")?;
    debug!(user_id = caller.user_id, "create_quotation command");

    let payload = parse_quotation_payload(payload)?;
    Ok(db.quotations().create(caller.user_id, &payload).await?)
}

/// Replaces a quotation's header fields and its whole line set.
pub async fn update_quotation(
    db: &Database,
    identity: Option<&Identity>,
    id: i64,
    payload: &Value,
) -> Result<QuotationDetail, ApiError> {
    let caller = authorize(identity, SELLING_ROLES, "update quotations")?;
    debug!(user_id = caller.user_id, id, "update_quotation command");

    let payload = parse_quotation_payload(payload)?;
    Ok(db.quotations().update(id, &payload).await?)
}

pub async fn get_quotation(
    db: &Database,
    identity: Option<&Identity>,
    id: i64,
) -> Result<QuotationDetail, ApiError> {
    authorize(identity, ANY_ROLE, "read quotations")?;
    debug!(id, "get_quotation command");

    db.quotations()
        .get(id)
        .await?
        .ok_or_else(|| CoreError::QuotationNotFound(id).into())
}

/// Lists the most recent quotations, newest first.
pub async fn list_quotations(
    db: &Database,
    identity: Option<&Identity>,
) -> Result<Vec<Quotation>, ApiError> {
    authorize(identity, ANY_ROLE, "list quotations")?;
    Ok(db.quotations().list().await?)
}

pub async fn delete_quotation(
    db: &Database,
    identity: Option<&Identity>,
    id: i64,
) -> Result<(), ApiError> {
    let caller = authorize(identity, SELLING_ROLES, "delete quotations")?;
    debug!(user_id = caller.user_id, id, "delete_quotation command");

    Ok(db.quotations().delete(id).await?)
}
