// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use tempfile::TempDir;
use tokio::sync::mpsc;

use partstock_api::{
    config::AppConfig,
    db,
    events::{self, EventSender},
    handlers::AppServices,
    tabular::CatalogRow,
    AppState,
};

/// Harness that spins up application state over a throwaway SQLite file.
/// The temp directory (and the database in it) is removed on drop.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_file = db_dir.path().join("partstock_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));
        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Replaces the active catalog generation for `stock_type` with `rows`.
    pub async fn seed_catalog(&self, stock_type: &str, rows: Vec<CatalogRow>) {
        self.state
            .services
            .catalog
            .replace_catalog(rows, stock_type)
            .await
            .expect("failed to seed catalog");
    }

    /// Live free stock of the active row, or None when no row matches.
    pub async fn free_stock(&self, part_number: &str, stock_type: &str) -> Option<i64> {
        self.state
            .services
            .catalog
            .find_active(part_number, stock_type)
            .await
            .expect("stock lookup failed")
            .map(|row| row.free_stock)
    }
}

/// Shorthand catalog row for seeding.
pub fn part(
    part_number: &str,
    stock: i64,
    price: Decimal,
    superseded_by: Option<&str>,
) -> CatalogRow {
    CatalogRow {
        part_number: part_number.to_string(),
        description: Some(format!("{} description", part_number)),
        free_stock: stock,
        price,
        superseded_by: superseded_by.map(|s| s.to_string()),
    }
}
