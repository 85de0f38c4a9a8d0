//! End-to-end behaviour of the operation surface: JSON payload in,
//! receipt or `ApiError` out, against a real SQLite database.

use std::path::PathBuf;

use serde_json::{json, Value};
use stockroom_backoffice::commands::{margin, quotation, restock, sale};
use stockroom_backoffice::ErrorKind;
use stockroom_core::{Identity, Money, NewProduct, Product, Role};
use stockroom_db::{Database, DbConfig};
use uuid::Uuid;

async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn user(db: &Database, name: &str, role: Role) -> Identity {
    let user = db.users().insert(name, role).await.unwrap();
    Identity::new(user.id, user.role)
}

async fn product(db: &Database, code: &str, sale_cents: i64, stock: i64) -> Product {
    db.products()
        .insert(&NewProduct {
            code: code.to_string(),
            description: format!("Product {}", code),
            stock_qty: stock,
            stock_max: 100,
            purchase_price_cents: sale_cents / 2,
            sale_price_cents: Some(sale_cents),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn stock(db: &Database, id: i64) -> i64 {
    db.products().get_by_id(id).await.unwrap().unwrap().stock_qty
}

fn sale_payload(items: &[(i64, i64)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(id, qty)| json!({ "product_id": id, "quantity": qty }))
        .collect();
    json!({ "payment_method": "cash", "items": items })
}

/// A file-backed database so several pooled connections really contend.
struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("stockroom-{}.db", Uuid::new_v4()));
        TempDb { path }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

#[tokio::test]
async fn aggregated_quantity_over_stock_is_rejected() {
    let db = memory_db().await;
    let seller = user(&db, "Dana", Role::Sales).await;
    let p = product(&db, "A", 100, 5).await;

    // 3 + 3 exceeds 5 even though each line alone fits.
    let err = sale::commit_sale(&db, Some(&seller), &sale_payload(&[(p.id, 3), (p.id, 3)]))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.context["requested"], 6);
    assert_eq!(stock(&db, p.id).await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_never_oversell() {
    let file = TempDb::new();
    let db = Database::new(DbConfig::new(file.path.clone()).max_connections(8))
        .await
        .unwrap();
    let seller = user(&db, "Dana", Role::Sales).await;
    let p = product(&db, "A", 100, 5).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        let payload = sale_payload(&[(p.id, 2)]);
        handles.push(tokio::spawn(async move {
            sale::commit_sale(&db, Some(&seller), &payload).await
        }));
    }

    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(err) => assert_eq!(err.kind, ErrorKind::Conflict, "{}", err),
        }
    }

    assert_eq!(committed, 2);
    assert_eq!(stock(&db, p.id).await, 1);
    assert_eq!(sale::list_sales(&db, Some(&seller)).await.unwrap().len(), 2);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_sales_and_restocks_all_commit() {
    let file = TempDb::new();
    let db = Database::new(DbConfig::new(file.path.clone()).max_connections(8))
        .await
        .unwrap();
    let seller = user(&db, "Dana", Role::Sales).await;
    let admin = user(&db, "Root", Role::Admin).await;
    let a = product(&db, "A", 100, 1_000).await;
    let b = product(&db, "B", 100, 1_000).await;
    let c = product(&db, "C", 100, 1_000).await;

    // Request orders disagree on purpose: [B, A] against [A, C].
    let mut handles = Vec::new();
    for round in 0..20 {
        let db = db.clone();
        let payload = if round % 2 == 0 {
            sale_payload(&[(b.id, 1), (a.id, 2)])
        } else {
            sale_payload(&[(a.id, 2), (c.id, 1)])
        };
        handles.push(tokio::spawn(async move {
            sale::commit_sale(&db, Some(&seller), &payload).await.map(|_| ())
        }));
    }
    for _ in 0..10 {
        let db = db.clone();
        let batch = json!([
            { "product_id": c.id, "quantity_delta": 3 },
            { "product_id": a.id, "quantity_delta": 5 },
        ]);
        handles.push(tokio::spawn(async move {
            restock::restock(&db, Some(&admin), &batch).await.map(|_| ())
        }));
    }
    for _ in 0..10 {
        let db = db.clone();
        let items = json!({ "items": [{ "product_id": a.id, "quantity": 4 }, { "product_id": b.id }] });
        handles.push(tokio::spawn(async move {
            quotation::create_quotation(&db, Some(&seller), &items).await.map(|_| ())
        }));
    }

    for handle in handles {
        if let Err(err) = handle.await.unwrap() {
            panic!("concurrent operation failed: {:?}", err);
        }
    }

    // 20 sales debit A by 2 each; B and C are each in 10 of them.
    assert_eq!(stock(&db, a.id).await, 1_000 - 40 + 50);
    assert_eq!(stock(&db, b.id).await, 1_000 - 10);
    assert_eq!(stock(&db, c.id).await, 1_000 - 10 + 30);
    assert_eq!(sale::list_sales(&db, Some(&seller)).await.unwrap().len(), 20);
    assert_eq!(quotation::list_quotations(&db, Some(&seller)).await.unwrap().len(), 10);

    db.close().await;
}

#[tokio::test]
async fn overflowing_quotation_quantity_is_a_validation_error() {
    let db = memory_db().await;
    let seller = user(&db, "Dana", Role::Sales).await;
    let p = product(&db, "A", 2_000, 10).await;

    let err = quotation::create_quotation(
        &db,
        Some(&seller),
        &json!({ "items": [{ "product_id": p.id, "quantity": "9000000000000000000" }] }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ValidationError);
    assert_eq!(err.context["field"], "items[0].quantity");
    assert_eq!(err.context["max"], i64::MAX / 2_000);
    assert!(quotation::list_quotations(&db, Some(&seller)).await.unwrap().is_empty());
}

#[tokio::test]
async fn overflowing_sale_total_changes_nothing() {
    let db = memory_db().await;
    let seller = user(&db, "Dana", Role::Sales).await;
    let admin = user(&db, "Root", Role::Admin).await;
    let p = product(&db, "A", 2_000, 5).await;

    let huge: i64 = 4_600_000_000_000_000_000;
    restock::restock(&db, Some(&admin), &json!([{ "product_id": p.id, "quantity_delta": huge }]))
        .await
        .unwrap();

    let err = sale::commit_sale(&db, Some(&seller), &sale_payload(&[(p.id, huge)]))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ValidationError);
    assert_eq!(err.context["field"], "items[0].quantity");
    assert_eq!(stock(&db, p.id).await, huge + 5);
    assert!(sale::list_sales(&db, Some(&seller)).await.unwrap().is_empty());
}

#[tokio::test]
async fn overflowing_restock_is_a_conflict() {
    let db = memory_db().await;
    let admin = user(&db, "Root", Role::Admin).await;
    let p = product(&db, "A", 100, 5).await;

    let err = restock::restock(
        &db,
        Some(&admin),
        &json!([{ "product_id": p.id, "quantity_delta": i64::MAX }]),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.context["product_id"], p.id);
    assert_eq!(stock(&db, p.id).await, 5);
}

#[tokio::test]
async fn margin_resolution_uses_covering_range() {
    let db = memory_db().await;
    let admin = user(&db, "Root", Role::Admin).await;

    margin::create_margin_range(&db, Some(&admin), &json!({ "min": 0, "max": 100, "percentage": 10 }))
        .await
        .unwrap();
    margin::create_margin_range(
        &db,
        Some(&admin),
        &json!({ "min": "100.01", "max": null, "percentage": 5 }),
    )
    .await
    .unwrap();

    let low = margin::resolve_sale_price(&db, Some(&admin), &json!(50)).await.unwrap();
    let high = margin::resolve_sale_price(&db, Some(&admin), &json!(200)).await.unwrap();
    assert_eq!(low, Money::from_cents(5_500));
    assert_eq!(high, Money::from_cents(21_000));

    let ranges = margin::list_margin_ranges(&db, Some(&admin)).await.unwrap();
    assert_eq!(ranges.len(), 2);
    assert!(ranges[0].min_cents < ranges[1].min_cents);
}

#[tokio::test]
async fn shared_boundary_is_an_overlap() {
    let db = memory_db().await;
    let admin = user(&db, "Root", Role::Admin).await;

    margin::create_margin_range(&db, Some(&admin), &json!({ "min": 0, "max": 100, "percentage": 10 }))
        .await
        .unwrap();
    let err = margin::create_margin_range(
        &db,
        Some(&admin),
        &json!({ "min": 100, "max": 200, "percentage": 5 }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(margin::list_margin_ranges(&db, Some(&admin)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn quotation_total_survives_price_change() {
    let db = memory_db().await;
    let seller = user(&db, "Dana", Role::Sales).await;
    let p = product(&db, "A", 2_000, 10).await;

    let created = quotation::create_quotation(
        &db,
        Some(&seller),
        &json!({ "items": [{ "product_id": p.id, "quantity": 3 }] }),
    )
    .await
    .unwrap();
    assert_eq!(created.quotation.total_cents, 6_000);

    db.products()
        .set_sale_price(p.id, Money::from_cents(2_500))
        .await
        .unwrap();

    let read = quotation::get_quotation(&db, Some(&seller), created.quotation.id)
        .await
        .unwrap();
    assert_eq!(read.quotation.total_cents, 6_000);
    assert_eq!(read.lines[0].unit_price_cents, 2_000);
}

#[tokio::test]
async fn restock_is_additive_not_idempotent() {
    let db = memory_db().await;
    let admin = user(&db, "Root", Role::Admin).await;
    let p = product(&db, "A", 100, 0).await;
    let batch = json!([{ "product_id": p.id, "quantity_delta": 5 }]);

    restock::restock(&db, Some(&admin), &batch).await.unwrap();
    restock::restock(&db, Some(&admin), &batch).await.unwrap();

    assert_eq!(stock(&db, p.id).await, 10);
}

#[tokio::test]
async fn sale_with_unknown_product_leaves_no_trace() {
    let db = memory_db().await;
    let seller = user(&db, "Dana", Role::Sales).await;
    let p = product(&db, "A", 100, 5).await;

    let err = sale::commit_sale(&db, Some(&seller), &sale_payload(&[(p.id, 1), (987_654, 1)]))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.context["product_id"], 987_654);
    assert_eq!(stock(&db, p.id).await, 5);
    assert!(sale::list_sales(&db, Some(&seller)).await.unwrap().is_empty());
}

#[tokio::test]
async fn restock_with_one_bad_entry_changes_nothing() {
    let db = memory_db().await;
    let admin = user(&db, "Root", Role::Admin).await;
    let a = product(&db, "A", 100, 1).await;
    let b = product(&db, "B", 100, 2).await;
    let c = product(&db, "C", 100, 3).await;

    let err = restock::restock(
        &db,
        Some(&admin),
        &json!([
            { "product_id": a.id, "quantity_delta": 4 },
            { "product_id": b.id, "quantity_delta": -4 },
            { "product_id": c.id, "quantity_delta": 4 },
        ]),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ValidationError);
    assert_eq!(err.context["field"], "entries[1].quantity_delta");
    assert_eq!(stock(&db, a.id).await, 1);
    assert_eq!(stock(&db, b.id).await, 2);
    assert_eq!(stock(&db, c.id).await, 3);
}

#[tokio::test]
async fn inactive_product_restock_applies_nothing() {
    let db = memory_db().await;
    let admin = user(&db, "Root", Role::Admin).await;
    let a = product(&db, "A", 100, 1).await;
    let b = product(&db, "B", 100, 1).await;
    db.products().deactivate(b.id).await.unwrap();

    let err = restock::restock(
        &db,
        Some(&admin),
        &json!([
            { "product_id": a.id, "quantity_delta": 4 },
            { "product_id": b.id, "quantity_delta": 4 },
        ]),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(stock(&db, a.id).await, 1);
}

#[tokio::test]
async fn derived_sale_price_follows_margin_table() {
    let db = memory_db().await;
    let admin = user(&db, "Root", Role::Admin).await;
    margin::create_margin_range(&db, Some(&admin), &json!({ "min": 0, "max": null, "percentage": 20 }))
        .await
        .unwrap();

    let p = db
        .products()
        .insert(&NewProduct {
            code: "D-1".to_string(),
            description: "Derived".to_string(),
            purchase_price_cents: 1_000,
            sale_price_cents: None,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(p.sale_price_cents, 1_200);
}
