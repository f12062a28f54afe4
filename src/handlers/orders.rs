use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{order, order_item, order::OrderStatus};
use crate::services::allocation::OrderItemInput;
use crate::tabular;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub stock_type: String,
    #[validate(length(min = 1))]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteOrdersQuery {
    pub stock_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Commit the submitted items as an order, allocating against live stock
#[utoipa::path(
    post,
    path = "/api/v1/orders/checkout",
    summary = "Checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order committed", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Empty order or invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Allocation lost a concurrent stock race", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResponse>>), ServiceError> {
    request.validate()?;
    let order_id = state
        .services
        .allocation
        .commit_order(request.user_id, &request.stock_type, request.items)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CheckoutResponse { order_id })),
    ))
}

/// List all orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    responses(
        (status = 200, description = "Orders", body = ApiResponse<Vec<order::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<order::Model>>>, ServiceError> {
    let orders = state.services.orders.list_orders().await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Fetch one order with its item snapshots
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderDetail>>, ServiceError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
    let items = state.services.orders.order_items(id).await?;
    Ok(Json(ApiResponse::success(OrderDetail { order, items })))
}

/// One user's order history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/orders/user/{user_id}",
    summary = "User orders",
    params(("user_id" = Uuid, Path, description = "Order owner")),
    responses(
        (status = 200, description = "Orders", body = ApiResponse<Vec<order::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn user_orders(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<order::Model>>>, ServiceError> {
    let orders = state.services.orders.user_orders(user_id).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Export one order's items as CSV
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/export",
    summary = "Export order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "CSV export of order items", content_type = "text/csv"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn export_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    if state.services.orders.get_order(id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("Order {} not found", id)));
    }
    let rows = state.services.orders.order_export_rows(id).await?;
    let csv = tabular::order_csv(&rows)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"order_{}.csv\"", id),
            ),
        ],
        csv,
    ))
}

/// Accept or reject an order; moving into Rejected restores stock once
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    summary = "Update order status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order after transition", body = ApiResponse<order::Model>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<order::Model>>, ServiceError> {
    let updated = state
        .services
        .orders
        .update_status(id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete an order, restoring its allocated stock
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    summary = "Delete order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted", body = ApiResponse<String>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(Json(ApiResponse::success("deleted".to_string())))
}

/// Delete every order for a stock type, restoring non-rejected allocations
#[utoipa::path(
    delete,
    path = "/api/v1/orders",
    summary = "Delete orders by stock type",
    params(("stock_type" = String, Query, description = "Catalog partition")),
    responses(
        (status = 200, description = "Orders deleted", body = ApiResponse<u64>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_all_orders(
    State(state): State<AppState>,
    Query(query): Query<DeleteOrdersQuery>,
) -> Result<Json<ApiResponse<u64>>, ServiceError> {
    let deleted = state
        .services
        .orders
        .delete_all_orders(&query.stock_type)
        .await?;
    Ok(Json(ApiResponse::success(deleted)))
}

/// Wipe the full order history across stock types
#[utoipa::path(
    delete,
    path = "/api/v1/orders/history",
    summary = "Delete order history",
    responses(
        (status = 200, description = "Orders deleted", body = ApiResponse<u64>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_history(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<u64>>, ServiceError> {
    let deleted = state.services.orders.delete_all_history().await?;
    Ok(Json(ApiResponse::success(deleted)))
}
