pub mod bulk;
pub mod cart;
pub mod catalog;
pub mod orders;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::events::EventSender;
use crate::services::{
    allocation::AllocationService, cart::CartService, catalog::CatalogService,
    orders::OrderService, reconciliation::BulkReconciliationService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub allocation: Arc<AllocationService>,
    pub reconciliation: Arc<BulkReconciliationService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        let catalog = Arc::new(CatalogService::new(db.clone(), event_sender.clone()));
        let cart = Arc::new(CartService::new(
            db.clone(),
            catalog.clone(),
            event_sender.clone(),
        ));
        let allocation = Arc::new(AllocationService::new(db.clone(), event_sender.clone()));
        let reconciliation = Arc::new(BulkReconciliationService::new(db.clone()));
        let orders = Arc::new(OrderService::new(db, event_sender));

        Self {
            catalog,
            cart,
            allocation,
            reconciliation,
            orders,
        }
    }
}
