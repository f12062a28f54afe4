mod common;

use common::{part, TestApp};
use partstock_api::tabular;
use rust_decimal_macros::dec;

const STOCK_TYPE: &str = "main";

#[tokio::test]
async fn search_matches_normalized_and_ranks_prefixes_first() {
    let app = TestApp::new().await;
    app.seed_catalog(
        STOCK_TYPE,
        vec![
            part("XAB-123", 5, dec!(1.00), None),
            part("AB-123", 5, dec!(1.00), None),
            part("AB-999", 5, dec!(1.00), None),
        ],
    )
    .await;

    // Hyphens and the O/0 confusion are ignored during matching.
    let results = app
        .state
        .services
        .catalog
        .search("ab123", STOCK_TYPE, dec!(0))
        .await
        .expect("search failed");

    let numbers: Vec<&str> = results.iter().map(|r| r.part_number.as_str()).collect();
    assert_eq!(numbers, vec!["AB-123", "XAB-123"]);
}

#[tokio::test]
async fn search_is_idempotent_and_deduplicates() {
    let app = TestApp::new().await;
    app.seed_catalog(
        STOCK_TYPE,
        vec![
            part("AB-100", 5, dec!(1.00), None),
            part("AB-200", 5, dec!(1.00), None),
        ],
    )
    .await;

    let first = app
        .state
        .services
        .catalog
        .search("AB", STOCK_TYPE, dec!(0))
        .await
        .expect("search failed");
    let second = app
        .state
        .services
        .catalog
        .search("AB", STOCK_TYPE, dec!(0))
        .await
        .expect("search failed");
    assert_eq!(first, second);

    let mut numbers: Vec<&str> = first.iter().map(|r| r.part_number.as_str()).collect();
    let before = numbers.len();
    numbers.dedup();
    assert_eq!(before, numbers.len());
}

#[tokio::test]
async fn search_applies_price_adjustment() {
    let app = TestApp::new().await;
    app.seed_catalog(STOCK_TYPE, vec![part("AB-100", 5, dec!(100.00), None)])
        .await;

    let results = app
        .state
        .services
        .catalog
        .search("AB-100", STOCK_TYPE, dec!(-5))
        .await
        .expect("search failed");
    assert_eq!(results[0].price, dec!(95.00));
}

#[tokio::test]
async fn search_resolves_supersession_chain() {
    let app = TestApp::new().await;
    app.seed_catalog(
        STOCK_TYPE,
        vec![
            part("OLD-1", 0, dec!(10.00), Some("MID-1")),
            part("MID-1", 0, dec!(11.00), Some("NEW-1")),
            part("NEW-1", 7, dec!(12.00), None),
        ],
    )
    .await;

    let results = app
        .state
        .services
        .catalog
        .search("OLD-1", STOCK_TYPE, dec!(0))
        .await
        .expect("search failed");

    let hit = results
        .iter()
        .find(|r| r.part_number == "OLD-1")
        .expect("OLD-1 missing from results");
    assert!(hit.has_supersession);

    let first = hit.replacement.as_ref().expect("chain missing");
    assert_eq!(first.part_number, "MID-1");
    let second = first
        .nested_replacement
        .as_ref()
        .expect("nested replacement missing");
    assert_eq!(second.part_number, "NEW-1");
    assert_eq!(second.free_stock, 7);
    assert!(second.nested_replacement.is_none());
}

#[tokio::test]
async fn supersession_resolution_stops_at_depth_limit() {
    let app = TestApp::new().await;
    // A two-element cycle would recurse forever without the depth cut-off.
    app.seed_catalog(
        STOCK_TYPE,
        vec![
            part("LOOP-A", 1, dec!(1.00), Some("LOOP-B")),
            part("LOOP-B", 1, dec!(1.00), Some("LOOP-A")),
        ],
    )
    .await;

    let results = app
        .state
        .services
        .catalog
        .search("LOOP-A", STOCK_TYPE, dec!(0))
        .await
        .expect("search failed");

    let hit = results
        .iter()
        .find(|r| r.part_number == "LOOP-A")
        .expect("LOOP-A missing");
    let mut depth = 0;
    let mut node = hit.replacement.as_ref();
    while let Some(current) = node {
        depth += 1;
        node = current.nested_replacement.as_deref();
    }
    assert!(depth <= 6, "chain deeper than the cut-off: {}", depth);
    assert!(depth >= 1);
}

#[tokio::test]
async fn upload_replaces_the_active_generation() {
    let app = TestApp::new().await;
    app.seed_catalog(STOCK_TYPE, vec![part("AB-100", 5, dec!(1.00), None)])
        .await;

    let csv = b"part_number,description,stock,price($)\nCD-200,brake pad,8,\"$1,250.50\"\n";
    let rows = tabular::parse_catalog_csv(csv).expect("parse failed");
    app.state
        .services
        .catalog
        .replace_catalog(rows, STOCK_TYPE)
        .await
        .expect("upload failed");

    // The previous generation is inactive; only the new rows are live.
    assert_eq!(app.free_stock("AB-100", STOCK_TYPE).await, None);
    assert_eq!(app.free_stock("CD-200", STOCK_TYPE).await, Some(8));

    let hit = app
        .state
        .services
        .catalog
        .find_active("CD-200", STOCK_TYPE)
        .await
        .expect("lookup failed")
        .expect("CD-200 missing");
    assert_eq!(hit.price, dec!(1250.50));
}

#[tokio::test]
async fn upload_does_not_affect_other_stock_types() {
    let app = TestApp::new().await;
    app.seed_catalog("main", vec![part("AB-100", 5, dec!(1.00), None)])
        .await;
    app.seed_catalog("aftermarket", vec![part("ZZ-900", 3, dec!(2.00), None)])
        .await;

    assert_eq!(app.free_stock("AB-100", "main").await, Some(5));
    assert_eq!(app.free_stock("ZZ-900", "aftermarket").await, Some(3));
}

#[tokio::test]
async fn export_round_trips_the_uploaded_catalog() {
    let app = TestApp::new().await;
    let csv = b"part_number,description,stock,price($)\nAB-100,filter,5,$10.00\nCD-200,gasket,2,$4.25\n";
    let rows = tabular::parse_catalog_csv(csv).expect("parse failed");
    app.state
        .services
        .catalog
        .replace_catalog(rows, STOCK_TYPE)
        .await
        .expect("upload failed");

    let export = app
        .state
        .services
        .catalog
        .stock_export_rows(STOCK_TYPE)
        .await
        .expect("export failed");
    assert_eq!(export.len(), 2);
    assert_eq!(export[0].part_number, "AB-100");
    assert_eq!(export[0].stock, 5);
    assert_eq!(export[1].part_number, "CD-200");
    assert_eq!(export[1].description.as_deref(), Some("gasket"));

    let bytes = tabular::stock_csv(&export).expect("serialize failed");
    let text = String::from_utf8(bytes).expect("invalid utf8");
    assert!(text.contains("AB-100"));
    assert!(text.contains("gasket"));
}

#[tokio::test]
async fn reset_hard_deletes_every_generation() {
    let app = TestApp::new().await;
    app.seed_catalog(STOCK_TYPE, vec![part("AB-100", 5, dec!(1.00), None)])
        .await;
    app.seed_catalog(STOCK_TYPE, vec![part("CD-200", 2, dec!(1.00), None)])
        .await;

    let deleted = app
        .state
        .services
        .catalog
        .reset_stock(STOCK_TYPE)
        .await
        .expect("reset failed");
    // Both the inactive first generation and the active second one go.
    assert_eq!(deleted, 2);
    assert_eq!(app.free_stock("CD-200", STOCK_TYPE).await, None);
}
