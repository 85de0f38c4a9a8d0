//! # Sale Commands

use serde_json::Value;
use stockroom_core::auth::{ANY_ROLE, SELLING_ROLES};
use stockroom_core::validation::parse_sale_request;
use stockroom_core::{authorize, Identity, Sale, SaleDetail, SaleReceipt};
use stockroom_db::Database;
use tracing::debug;

use crate::error::ApiError;

/// Commits a binding sale for the calling seller.
///
/// ## Payload
/// ```json
/// { "payment_method": "cash",
///   "items": [{ "product_id": 3, "quantity": 2 }, { "product_id": 3, "quantity": 1 }] }
/// ```
/// Duplicate product ids are summed. Any price in the payload is ignored;
/// the receipt is priced from the catalog under lock.
///
/// The role check and payload validation both run before a transaction is
/// opened.
pub async fn commit_sale(
    db: &Database,
    identity: Option<&Identity>,
    payload: &Value,
) -> Result<SaleReceipt, ApiError> {
    let caller = authorize(identity, SELLING_ROLES, "commit sales")?;
    debug!(user_id = caller.user_id, "commit_sale command");

    let order = parse_sale_request(payload, caller.user_id)?;
    Ok(db.sales().commit(&order).await?)
}

pub async fn get_sale(
    db: &Database,
    identity: Option<&Identity>,
    id: i64,
) -> Result<SaleDetail, ApiError> {
    authorize(identity, ANY_ROLE, "read sales")?;
    Ok(db.sales().require(id).await?)
}

/// Lists committed sales, newest first.
pub async fn list_sales(
    db: &Database,
    identity: Option<&Identity>,
) -> Result<Vec<Sale>, ApiError> {
    authorize(identity, ANY_ROLE, "list sales")?;
    Ok(db.sales().list().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{identity, memory_db, product, stock};
    use crate::error::ErrorKind;
    use serde_json::json;
    use stockroom_core::{PaymentMethod, Role};

    #[tokio::test]
    async fn test_commit_ignores_client_prices() {
        let db = memory_db().await;
        let seller = identity(&db, "Dana", Role::Sales).await;
        let p = product(&db, "A", 750, 10).await;

        let receipt = commit_sale(
            &db,
            Some(&seller),
            &json!({
                "payment_method": "card",
                "items": [{ "product_id": p.id, "quantity": 2, "unit_price": "0.01" }],
            }),
        )
        .await
        .unwrap();

        assert_eq!(receipt.total_cents, 1500);
        assert_eq!(receipt.payment_method, PaymentMethod::Card);
        assert_eq!(receipt.lines[0].description, "Item A");
        assert_eq!(stock(&db, p.id).await, 8);

        let detail = get_sale(&db, Some(&seller), receipt.sale_id).await.unwrap();
        assert_eq!(detail.sale.seller_id, seller.user_id);
        assert_eq!(list_sales(&db, Some(&seller)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_write() {
        let db = memory_db().await;
        let seller = identity(&db, "Dana", Role::Sales).await;
        let p = product(&db, "A", 100, 10).await;

        let cases = [
            json!({ "items": [{ "product_id": p.id, "quantity": 1 }] }),
            json!({ "payment_method": "cash", "items": [] }),
            json!({ "payment_method": "cash", "items": [{ "product_id": p.id, "quantity": 0 }] }),
            json!({ "payment_method": "cash", "items": [{ "product_id": p.id, "quantity": "two" }] }),
            json!({ "payment_method": "barter", "items": [{ "product_id": p.id, "quantity": 1 }] }),
        ];

        for payload in &cases {
            let err = commit_sale(&db, Some(&seller), payload).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::ValidationError, "payload {}", payload);
        }
        assert_eq!(stock(&db, p.id).await, 10);
        assert!(list_sales(&db, Some(&seller)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_viewer_cannot_sell() {
        let db = memory_db().await;
        let viewer = identity(&db, "Vera", Role::Viewer).await;
        let p = product(&db, "A", 100, 10).await;
        let payload = json!({ "payment_method": "cash", "items": [{ "product_id": p.id, "quantity": 1 }] });

        let err = commit_sale(&db, Some(&viewer), &payload).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthError);

        let err = commit_sale(&db, None, &payload).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthError);

        assert_eq!(stock(&db, p.id).await, 10);
    }

    #[tokio::test]
    async fn test_short_stock_reports_quantities() {
        let db = memory_db().await;
        let seller = identity(&db, "Dana", Role::Sales).await;
        let p = product(&db, "A", 100, 2).await;

        let err = commit_sale(
            &db,
            Some(&seller),
            &json!({ "payment_method": "cash", "items": [{ "product_id": p.id, "quantity": 3 }] }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.context["available"], 2);
        assert_eq!(err.context["requested"], 3);
    }

    #[tokio::test]
    async fn test_missing_sale() {
        let db = memory_db().await;
        let viewer = identity(&db, "Vera", Role::Viewer).await;

        let err = get_sale(&db, Some(&viewer), 12).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.context["sale_id"], 12);
    }
}
