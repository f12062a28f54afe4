use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::cart_item;
use crate::services::cart::{AddToCartInput, CartLineView};
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartQuery {
    pub user_id: Uuid,
    pub stock_type: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClearCartQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateQtyRequest {
    #[validate(range(min = 1))]
    pub requested_qty: i64,
}

/// Add an item to the cart (duplicate part numbers merge by summing)
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    summary = "Add cart item",
    request_body = AddToCartInput,
    responses(
        (status = 201, description = "Cart line after add or merge", body = ApiResponse<cart_item::Model>),
        (status = 400, description = "Invalid quantity or part number", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    Json(input): Json<AddToCartInput>,
) -> Result<(StatusCode, Json<ApiResponse<cart_item::Model>>), ServiceError> {
    let line = state.services.cart.add_item(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(line))))
}

/// List the cart with a live allocation preview per line
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    summary = "List cart",
    params(
        ("user_id" = Uuid, Query, description = "Cart owner"),
        ("stock_type" = String, Query, description = "Catalog partition for availability"),
    ),
    responses(
        (status = 200, description = "Cart lines, newest first", body = ApiResponse<Vec<CartLineView>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CartQuery>,
) -> Result<Json<ApiResponse<Vec<CartLineView>>>, ServiceError> {
    let lines = state
        .services
        .cart
        .list(query.user_id, &query.stock_type)
        .await?;
    Ok(Json(ApiResponse::success(lines)))
}

/// Overwrite a cart line's quantity
#[utoipa::path(
    put,
    path = "/api/v1/cart/items/{id}",
    summary = "Update cart quantity",
    params(("id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateQtyRequest,
    responses(
        (status = 200, description = "Updated cart line", body = ApiResponse<cart_item::Model>),
        (status = 400, description = "Quantity must be positive", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart item not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_qty(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateQtyRequest>,
) -> Result<Json<ApiResponse<cart_item::Model>>, ServiceError> {
    request.validate()?;
    let line = state
        .services
        .cart
        .update_qty(id, request.requested_qty)
        .await?;
    Ok(Json(ApiResponse::success(line)))
}

/// Remove a cart line
#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{id}",
    summary = "Remove cart item",
    params(("id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<String>),
        (status = 404, description = "Cart item not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<String>>, ServiceError> {
    state.services.cart.remove(id).await?;
    Ok(Json(ApiResponse::success("removed".to_string())))
}

/// Empty a user's cart
#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    summary = "Clear cart",
    params(("user_id" = Uuid, Query, description = "Cart owner")),
    responses(
        (status = 200, description = "Lines removed", body = ApiResponse<u64>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn clear(
    State(state): State<AppState>,
    Query(query): Query<ClearCartQuery>,
) -> Result<Json<ApiResponse<u64>>, ServiceError> {
    let removed = state.services.cart.clear(query.user_id).await?;
    Ok(Json(ApiResponse::success(removed)))
}
