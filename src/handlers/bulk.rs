use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::orders::CheckoutResponse;
use crate::services::allocation::OrderItemInput;
use crate::services::reconciliation::ReconciledRow;
use crate::tabular;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReconcileQuery {
    pub stock_type: String,
    #[serde(default)]
    pub adjustment_percent: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkCommitRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub stock_type: String,
    /// Preview rows the caller accepted, as returned by the reconcile step.
    #[validate(length(min = 1))]
    pub rows: Vec<ReconciledRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileResponse {
    pub rows: Vec<ReconciledRow>,
}

/// Reconcile an uploaded requirement list against live stock (preview only)
#[utoipa::path(
    post,
    path = "/api/v1/bulk/reconcile",
    summary = "Reconcile bulk enquiry",
    request_body(content = String, content_type = "text/csv"),
    params(
        ("stock_type" = String, Query, description = "Catalog partition"),
        ("adjustment_percent" = Option<String>, Query, description = "Price adjustment percentage (default 0)"),
    ),
    responses(
        (status = 200, description = "Preview rows; stock is untouched", body = ApiResponse<ReconcileResponse>),
        (status = 400, description = "Malformed CSV or missing columns", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn reconcile(
    State(state): State<AppState>,
    Query(query): Query<ReconcileQuery>,
    body: Bytes,
) -> Result<Json<ApiResponse<ReconcileResponse>>, ServiceError> {
    let rows = tabular::parse_bulk_csv(&body)?;
    let reconciled = state
        .services
        .reconciliation
        .reconcile(&rows, &query.stock_type, query.adjustment_percent)
        .await?;
    Ok(Json(ApiResponse::success(ReconcileResponse {
        rows: reconciled,
    })))
}

/// Commit accepted preview rows as an order through the allocation engine
#[utoipa::path(
    post,
    path = "/api/v1/bulk/commit",
    summary = "Commit bulk enquiry",
    request_body = BulkCommitRequest,
    responses(
        (status = 201, description = "Order committed", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "No committable rows", body = crate::errors::ErrorResponse),
        (status = 409, description = "Stock moved since the preview", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn commit(
    State(state): State<AppState>,
    Json(request): Json<BulkCommitRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResponse>>), ServiceError> {
    request.validate()?;

    // Invalid-part rows carry nothing fulfillable; committing re-allocates
    // against live stock, so the preview's allocation numbers are advisory.
    let items: Vec<OrderItemInput> = request
        .rows
        .into_iter()
        .filter(|row| !row.no_record)
        .map(|row| OrderItemInput {
            part_number: row.part_number,
            description: row.description,
            requested_qty: row.requested_qty.max(row.allocated_qty),
            price: row.price,
            supersedes: row.supersedes,
        })
        .collect();

    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "no committable rows: every row was an invalid part".to_string(),
        ));
    }

    let order_id = state
        .services
        .allocation
        .commit_order(request.user_id, &request.stock_type, items)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CheckoutResponse { order_id })),
    ))
}
