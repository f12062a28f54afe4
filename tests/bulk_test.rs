mod common;

use common::{part, TestApp};
use partstock_api::services::reconciliation::RowStatus;
use partstock_api::tabular::{self, BulkRow};
use rust_decimal_macros::dec;

const STOCK_TYPE: &str = "main";

fn row(serial: &str, part_number: &str, qty: i64) -> BulkRow {
    BulkRow {
        serial_no: serial.to_string(),
        part_number: part_number.to_string(),
        requested_qty: qty,
    }
}

#[tokio::test]
async fn reconcile_splits_shortfall_onto_the_replacement() {
    let app = TestApp::new().await;
    app.seed_catalog(
        STOCK_TYPE,
        vec![
            part("OLD-1", 5, dec!(10.00), Some("NEW-1")),
            part("NEW-1", 30, dec!(12.00), None),
        ],
    )
    .await;

    let rows = app
        .state
        .services
        .reconciliation
        .reconcile(&[row("1", "OLD-1", 20)], STOCK_TYPE, dec!(0))
        .await
        .expect("reconcile failed");

    assert_eq!(rows.len(), 2);

    let parent = &rows[0];
    assert_eq!(parent.serial_no, "1");
    assert_eq!(parent.allocated_qty, 5);
    assert_eq!(parent.back_order, 15);
    assert_eq!(parent.status, RowStatus::PartialSplit);

    let child = &rows[1];
    assert_eq!(child.serial_no, "1.1");
    assert_eq!(child.part_number, "NEW-1");
    assert_eq!(child.allocated_qty, 15);
    assert_eq!(child.back_order, 0);
    assert_eq!(child.status, RowStatus::SupersededFulfillment);
    assert!(child
        .description
        .as_deref()
        .unwrap_or_default()
        .starts_with("(Superseded) "));

    // Preview only: nothing was deducted.
    assert_eq!(app.free_stock("OLD-1", STOCK_TYPE).await, Some(5));
    assert_eq!(app.free_stock("NEW-1", STOCK_TYPE).await, Some(30));
}

#[tokio::test]
async fn reconcile_flags_unknown_parts() {
    let app = TestApp::new().await;
    app.seed_catalog(STOCK_TYPE, vec![part("AB-100", 5, dec!(10.00), None)])
        .await;

    let rows = app
        .state
        .services
        .reconciliation
        .reconcile(&[row("1", "NO-SUCH", 4)], STOCK_TYPE, dec!(0))
        .await
        .expect("reconcile failed");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, RowStatus::InvalidPart);
    assert!(rows[0].no_record);
    assert_eq!(rows[0].back_order, 4);
    assert_eq!(rows[0].allocated_qty, 0);
    assert_eq!(rows[0].price, dec!(0));
}

#[tokio::test]
async fn reconcile_matches_on_the_normalized_key() {
    let app = TestApp::new().await;
    app.seed_catalog(STOCK_TYPE, vec![part("AB-100", 5, dec!(10.00), None)])
        .await;

    // Lowercase, no hyphen, O for 0: still the same part.
    let rows = app
        .state
        .services
        .reconciliation
        .reconcile(&[row("1", "ab1OO", 2)], STOCK_TYPE, dec!(0))
        .await
        .expect("reconcile failed");

    assert_eq!(rows[0].status, RowStatus::FullyAllocated);
    assert_eq!(rows[0].resolved_part_number.as_deref(), Some("AB-100"));
}

#[tokio::test]
async fn bulk_csv_parses_fuzzy_headers_and_autogenerates_serials() {
    let csv = b"Part Number,Quantity\nAB-100,4\nCD-200,2\n";
    let rows = tabular::parse_bulk_csv(csv).expect("parse failed");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].serial_no, "1");
    assert_eq!(rows[0].part_number, "AB-100");
    assert_eq!(rows[0].requested_qty, 4);
    assert_eq!(rows[1].serial_no, "2");
}

#[tokio::test]
async fn committing_accepted_rows_allocates_through_the_engine() {
    let app = TestApp::new().await;
    app.seed_catalog(
        STOCK_TYPE,
        vec![
            part("OLD-1", 5, dec!(10.00), Some("NEW-1")),
            part("NEW-1", 30, dec!(12.00), None),
        ],
    )
    .await;

    let preview = app
        .state
        .services
        .reconciliation
        .reconcile(&[row("1", "OLD-1", 20)], STOCK_TYPE, dec!(0))
        .await
        .expect("reconcile failed");

    // Re-submit both preview rows the way the commit endpoint does.
    let items: Vec<_> = preview
        .into_iter()
        .filter(|r| !r.no_record)
        .map(|r| partstock_api::services::allocation::OrderItemInput {
            part_number: r.part_number,
            description: r.description,
            requested_qty: r.requested_qty.max(r.allocated_qty),
            price: r.price,
            supersedes: r.supersedes,
        })
        .collect();

    let order_id = app
        .state
        .services
        .allocation
        .commit_order(uuid::Uuid::new_v4(), STOCK_TYPE, items)
        .await
        .expect("commit failed");

    assert_eq!(app.free_stock("OLD-1", STOCK_TYPE).await, Some(0));
    assert_eq!(app.free_stock("NEW-1", STOCK_TYPE).await, Some(15));

    let committed = app
        .state
        .services
        .orders
        .order_items(order_id)
        .await
        .expect("items lookup failed");
    assert_eq!(committed.len(), 2);
}
