use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::services::catalog::PartCandidate;
use crate::tabular;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub q: String,
    pub stock_type: String,
    /// Percentage applied to every base price, e.g. `-5` or `12.5`.
    #[serde(default)]
    pub adjustment_percent: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockTypeQuery {
    pub stock_type: String,
}

/// Search the active catalog
#[utoipa::path(
    get,
    path = "/api/v1/catalog/search",
    summary = "Search parts",
    params(
        ("q" = String, Query, description = "Part number fragment, description text, or supersession marker"),
        ("stock_type" = String, Query, description = "Catalog partition to search"),
        ("adjustment_percent" = Option<String>, Query, description = "Price adjustment percentage (default 0)"),
    ),
    responses(
        (status = 200, description = "Matching parts with resolved supersession chains", body = ApiResponse<Vec<PartCandidate>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<PartCandidate>>>, ServiceError> {
    let results = state
        .services
        .catalog
        .search(&query.q, &query.stock_type, query.adjustment_percent)
        .await?;
    Ok(Json(ApiResponse::success(results)))
}

/// Upload a catalog CSV, replacing the active generation for the stock type
#[utoipa::path(
    post,
    path = "/api/v1/catalog/upload",
    summary = "Upload catalog",
    request_body(content = String, content_type = "text/csv"),
    params(
        ("stock_type" = String, Query, description = "Catalog partition to replace"),
    ),
    responses(
        (status = 200, description = "Rows inserted", body = ApiResponse<usize>),
        (status = 400, description = "Malformed CSV", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<StockTypeQuery>,
    body: Bytes,
) -> Result<Json<ApiResponse<usize>>, ServiceError> {
    let rows = tabular::parse_catalog_csv(&body)?;
    let inserted = state
        .services
        .catalog
        .replace_catalog(rows, &query.stock_type)
        .await?;
    Ok(Json(ApiResponse::success(inserted)))
}

/// Hard-delete every catalog generation for a stock type
#[utoipa::path(
    post,
    path = "/api/v1/catalog/reset",
    summary = "Reset stock",
    params(
        ("stock_type" = String, Query, description = "Catalog partition to wipe"),
    ),
    responses(
        (status = 200, description = "Rows deleted", body = ApiResponse<u64>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn reset(
    State(state): State<AppState>,
    Query(query): Query<StockTypeQuery>,
) -> Result<Json<ApiResponse<u64>>, ServiceError> {
    let deleted = state.services.catalog.reset_stock(&query.stock_type).await?;
    Ok(Json(ApiResponse::success(deleted)))
}

/// Export the active catalog as CSV
#[utoipa::path(
    get,
    path = "/api/v1/catalog/export",
    summary = "Export stock",
    params(
        ("stock_type" = String, Query, description = "Catalog partition to export"),
    ),
    responses(
        (status = 200, description = "CSV export of active rows", content_type = "text/csv"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn export(
    State(state): State<AppState>,
    Query(query): Query<StockTypeQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = state
        .services
        .catalog
        .stock_export_rows(&query.stock_type)
        .await?;
    let csv = tabular::stock_csv(&rows)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"stock_{}.csv\"", query.stock_type),
            ),
        ],
        csv,
    ))
}
