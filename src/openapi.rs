use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Partstock API",
        version = "1.0.0",
        description = r#"
# Partstock Order Allocation API

Parts catalog search with supersession resolution, cart and checkout with
transactional stock allocation, bulk requirement reconciliation, and a
reversible order ledger.

## Error Handling

Errors use a consistent response format with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Catalog", description = "Catalog search, upload, reset, export"),
        (name = "Cart", description = "Per-user cart with live allocation preview"),
        (name = "Orders", description = "Checkout, status transitions, reversal"),
        (name = "Bulk", description = "Bulk requirement reconciliation")
    ),
    paths(
        // Catalog
        crate::handlers::catalog::search,
        crate::handlers::catalog::upload,
        crate::handlers::catalog::reset,
        crate::handlers::catalog::export,

        // Cart
        crate::handlers::cart::add_item,
        crate::handlers::cart::list,
        crate::handlers::cart::update_qty,
        crate::handlers::cart::remove,
        crate::handlers::cart::clear,

        // Orders
        crate::handlers::orders::checkout,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::user_orders,
        crate::handlers::orders::export_order,
        crate::handlers::orders::update_status,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::delete_all_orders,
        crate::handlers::orders::delete_history,

        // Bulk
        crate::handlers::bulk::reconcile,
        crate::handlers::bulk::commit,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,

            crate::services::catalog::PartCandidate,
            crate::services::supersession::ReplacementNode,
            crate::services::cart::AddToCartInput,
            crate::services::cart::CartLineView,
            crate::services::allocation::OrderItemInput,
            crate::services::reconciliation::ReconciledRow,
            crate::services::reconciliation::RowStatus,

            crate::entities::order::OrderStatus,
            crate::entities::order::Model,
            crate::entities::order_item::Model,
            crate::entities::cart_item::Model,
            crate::handlers::orders::OrderDetail,
            crate::handlers::orders::CheckoutRequest,
            crate::handlers::orders::CheckoutResponse,
            crate::handlers::orders::UpdateStatusRequest,
            crate::handlers::bulk::BulkCommitRequest,
            crate::handlers::bulk::ReconcileResponse,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
