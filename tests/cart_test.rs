mod common;

use common::{part, TestApp};
use partstock_api::errors::ServiceError;
use partstock_api::services::cart::AddToCartInput;
use rust_decimal_macros::dec;
use uuid::Uuid;

const STOCK_TYPE: &str = "main";

fn add(user: Uuid, part_number: &str, qty: i64) -> AddToCartInput {
    AddToCartInput {
        user_id: user,
        part_number: part_number.to_string(),
        description: Some("cart line".to_string()),
        requested_qty: qty,
        price: dec!(10.00),
        supersedes: None,
    }
}

#[tokio::test]
async fn duplicate_adds_merge_by_summing() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();

    app.state
        .services
        .cart
        .add_item(add(user, "AB-100", 2))
        .await
        .expect("first add failed");
    // Same part in a different raw spelling merges into the same line.
    app.state
        .services
        .cart
        .add_item(add(user, "ab-1OO", 3))
        .await
        .expect("second add failed");

    let lines = app
        .state
        .services
        .cart
        .list(user, STOCK_TYPE)
        .await
        .expect("list failed");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].requested_qty, 5);
}

#[tokio::test]
async fn list_previews_allocation_against_live_stock() {
    let app = TestApp::new().await;
    app.seed_catalog(
        STOCK_TYPE,
        vec![
            part("FULL-1", 10, dec!(1.00), None),
            part("PART-1", 2, dec!(1.00), None),
        ],
    )
    .await;

    let user = Uuid::new_v4();
    let cart = &app.state.services.cart;
    cart.add_item(add(user, "FULL-1", 5)).await.expect("add failed");
    cart.add_item(add(user, "PART-1", 5)).await.expect("add failed");
    cart.add_item(add(user, "GONE-1", 5)).await.expect("add failed");

    let lines = cart.list(user, STOCK_TYPE).await.expect("list failed");
    assert_eq!(lines.len(), 3);

    let by_part = |pn: &str| {
        lines
            .iter()
            .find(|l| l.part_number == pn)
            .unwrap_or_else(|| panic!("{} missing", pn))
    };

    let full = by_part("FULL-1");
    assert_eq!(full.status, "Fully Allocated");
    assert_eq!(full.allocated_qty, 5);
    assert_eq!(full.back_order, 0);

    let partial = by_part("PART-1");
    assert_eq!(partial.status, "Partial Fulfillment");
    assert_eq!(partial.allocated_qty, 2);
    assert_eq!(partial.back_order, 3);

    let gone = by_part("GONE-1");
    assert_eq!(gone.status, "Out of Stock");
    assert_eq!(gone.allocated_qty, 0);
    assert_eq!(gone.back_order, 5);
}

#[tokio::test]
async fn preview_matches_stock_without_hyphens() {
    let app = TestApp::new().await;
    app.seed_catalog(STOCK_TYPE, vec![part("AB-100", 5, dec!(2.50), None)])
        .await;

    let user = Uuid::new_v4();
    let cart = &app.state.services.cart;
    // Raw input with no hyphen; the stored line still previews against the
    // hyphenated catalog row.
    cart.add_item(add(user, "ab1OO", 3)).await.expect("add failed");

    let lines = cart.list(user, STOCK_TYPE).await.expect("list failed");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].part_number, "AB100");
    assert_eq!(lines[0].status, "Fully Allocated");
    assert_eq!(lines[0].available_qty, 5);
    assert_eq!(lines[0].allocated_qty, 3);
    assert_eq!(lines[0].back_order, 0);
}

#[tokio::test]
async fn rejects_non_positive_quantities() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();

    let err = app
        .state
        .services
        .cart
        .add_item(add(user, "AB-100", 0))
        .await
        .expect_err("zero quantity should fail");
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let line = app
        .state
        .services
        .cart
        .add_item(add(user, "AB-100", 1))
        .await
        .expect("add failed");
    let err = app
        .state
        .services
        .cart
        .update_qty(line.id, -2)
        .await
        .expect_err("negative quantity should fail");
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn update_remove_and_clear() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();
    let cart = &app.state.services.cart;

    let first = cart.add_item(add(user, "AB-100", 1)).await.expect("add failed");
    let second = cart.add_item(add(user, "CD-200", 1)).await.expect("add failed");

    let updated = cart.update_qty(first.id, 9).await.expect("update failed");
    assert_eq!(updated.requested_qty, 9);

    cart.remove(second.id).await.expect("remove failed");
    let err = cart
        .remove(second.id)
        .await
        .expect_err("double remove should fail");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let cleared = cart.clear(user).await.expect("clear failed");
    assert_eq!(cleared, 1);
    assert!(cart
        .list(user, STOCK_TYPE)
        .await
        .expect("list failed")
        .is_empty());
}
