//! Partstock API Library
//!
//! Parts catalog search with supersession resolution, transactional stock
//! allocation at checkout, bulk requirement reconciliation, and a reversible
//! order ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod part_number;
pub mod services;
pub mod tabular;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API routes, nested under /api/v1 by the binary
pub fn api_v1_routes() -> Router<AppState> {
    let catalog = Router::new()
        .route("/catalog/search", get(handlers::catalog::search))
        .route("/catalog/upload", post(handlers::catalog::upload))
        .route("/catalog/reset", post(handlers::catalog::reset))
        .route("/catalog/export", get(handlers::catalog::export));

    let cart = Router::new()
        .route(
            "/cart",
            get(handlers::cart::list).delete(handlers::cart::clear),
        )
        .route("/cart/items", post(handlers::cart::add_item))
        .route(
            "/cart/items/:id",
            put(handlers::cart::update_qty).delete(handlers::cart::remove),
        );

    let orders = Router::new()
        .route("/orders/checkout", post(handlers::orders::checkout))
        .route(
            "/orders",
            get(handlers::orders::list_orders).delete(handlers::orders::delete_all_orders),
        )
        .route("/orders/history", delete(handlers::orders::delete_history))
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/orders/:id/export", get(handlers::orders::export_order))
        .route("/orders/:id/status", put(handlers::orders::update_status))
        .route("/orders/user/:user_id", get(handlers::orders::user_orders));

    let bulk = Router::new()
        .route("/bulk/reconcile", post(handlers::bulk::reconcile))
        .route("/bulk/commit", post(handlers::bulk::commit));

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(catalog)
        .merge(cart)
        .merge(orders)
        .merge(bulk)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "partstock-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn success_response_carries_data_and_timestamp() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, Some("ok"));
        assert!(response.message.is_none());
        DateTime::parse_from_rfc3339(&response.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn error_response_carries_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message.as_deref(), Some("oops"));
        assert!(response.errors.is_none());
    }

    #[test]
    fn validation_errors_response_lists_problems() {
        let response = ApiResponse::<()>::validation_errors(vec!["missing".into()]);
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Validation failed"));
        assert_eq!(response.errors, Some(vec!["missing".to_string()]));
        DateTime::parse_from_rfc3339(&response.timestamp).expect("timestamp should parse");
    }
}
