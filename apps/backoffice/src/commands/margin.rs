//! # Margin Range Commands
//!
//! The margin table maps purchase-price intervals to a markup percentage.
//! Ranges are closed on both ends and may not touch.

use serde_json::Value;
use stockroom_core::auth::{ANY_ROLE, SELLING_ROLES};
use stockroom_core::validation::{parse_margin_range, parse_money};
use stockroom_core::{authorize, Identity, MarginRange, Money};
use stockroom_db::Database;
use tracing::debug;

use crate::error::ApiError;

/// Lists ranges by ascending `min`.
pub async fn list_margin_ranges(
    db: &Database,
    identity: Option<&Identity>,
) -> Result<Vec<MarginRange>, ApiError> {
    authorize(identity, ANY_ROLE, "list margin ranges")?;
    Ok(db.margins().list().await?)
}

/// Creates a range from `{ "min": "0", "max": "100", "percentage": "10" }`.
///
/// `max` may be null, absent or `"Infinity"` for an unbounded tail.
pub async fn create_margin_range(
    db: &Database,
    identity: Option<&Identity>,
    payload: &Value,
) -> Result<MarginRange, ApiError> {
    let caller = authorize(identity, SELLING_ROLES, "create margin ranges")?;

    let input = parse_margin_range(payload)?;
    debug!(
        user_id = caller.user_id,
        min = input.bounds.min_cents(),
        max = ?input.bounds.max_cents(),
        "create_margin_range command"
    );

    Ok(db.margins().insert(&input).await?)
}

pub async fn update_margin_range(
    db: &Database,
    identity: Option<&Identity>,
    id: i64,
    payload: &Value,
) -> Result<MarginRange, ApiError> {
    let caller = authorize(identity, SELLING_ROLES, "update margin ranges")?;

    let input = parse_margin_range(payload)?;
    debug!(user_id = caller.user_id, id, "update_margin_range command");

    Ok(db.margins().update(id, &input).await?)
}

pub async fn delete_margin_range(
    db: &Database,
    identity: Option<&Identity>,
    id: i64,
) -> Result<(), ApiError> {
    let caller = authorize(identity, SELLING_ROLES, "delete margin ranges")?;
    debug!(user_id = caller.user_id, id, "delete_margin_range command");

    Ok(db.margins().delete(id).await?)
}

/// Derives the sale price for a purchase price given in major units.
pub async fn resolve_sale_price(
    db: &Database,
    identity: Option<&Identity>,
    purchase_price: &Value,
) -> Result<Money, ApiError> {
    authorize(identity, ANY_ROLE, "resolve sale prices")?;

    let purchase_price = parse_money(purchase_price, "purchase_price")?;
    Ok(db.margins().resolve_sale_price(purchase_price).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{identity, memory_db};
    use crate::error::ErrorKind;
    use serde_json::json;
    use stockroom_core::Role;

    #[tokio::test]
    async fn test_touching_ranges_conflict() {
        let db = memory_db().await;
        let seller = identity(&db, "Dana", Role::Sales).await;

        let first = create_margin_range(
            &db,
            Some(&seller),
            &json!({ "min": 0, "max": 100, "percentage": 10 }),
        )
        .await
        .unwrap();

        let err = create_margin_range(
            &db,
            Some(&seller),
            &json!({ "min": 100, "max": 200, "percentage": 5 }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.context["conflicting_id"], first.id);
        assert_eq!(list_margin_ranges(&db, Some(&seller)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = memory_db().await;
        let seller = identity(&db, "Dana", Role::Sales).await;

        let range = create_margin_range(
            &db,
            Some(&seller),
            &json!({ "min": "0", "max": "100", "percentage": "10" }),
        )
        .await
        .unwrap();

        let widened = update_margin_range(
            &db,
            Some(&seller),
            range.id,
            &json!({ "min": "0", "max": "Infinity", "percentage": "12.5" }),
        )
        .await
        .unwrap();
        assert_eq!(widened.max_cents, None);
        assert_eq!(widened.markup_bps, 1250);

        let price = resolve_sale_price(&db, Some(&seller), &json!("80")).await.unwrap();
        assert_eq!(price.cents(), 9_000);

        delete_margin_range(&db, Some(&seller), range.id).await.unwrap();
        let err = resolve_sale_price(&db, Some(&seller), &json!("80"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = delete_margin_range(&db, Some(&seller), range.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_inverted_range_is_validation_error() {
        let db = memory_db().await;
        let admin = identity(&db, "Root", Role::Admin).await;

        let err = create_margin_range(
            &db,
            Some(&admin),
            &json!({ "min": 50, "max": 10, "percentage": 5 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_viewer_cannot_edit_table() {
        let db = memory_db().await;
        let viewer = identity(&db, "Vera", Role::Viewer).await;

        let err = create_margin_range(
            &db,
            Some(&viewer),
            &json!({ "min": 0, "percentage": 5 }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthError);
        assert!(list_margin_ranges(&db, Some(&viewer)).await.unwrap().is_empty());
    }
}
