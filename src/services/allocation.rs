//! The allocation engine: the only component allowed to mutate stock
//! quantities.
//!
//! A commit converts submitted line items into allocation decisions inside a
//! single transaction. Shortfall is not an error: the allocated quantity is
//! capped at live stock and the difference is visible to callers as
//! `qty < requested_qty` on the stored item. Nothing survives a failed
//! transaction, so no compensating action is ever needed.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    cart_item::{self, Entity as CartItemEntity},
    order::{self, OrderStatus},
    order_item,
    stock_item::{self, Entity as StockItemEntity},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// One submitted line: what the customer asked for, priced at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub part_number: String,
    pub description: Option<String>,
    pub requested_qty: i64,
    pub price: Decimal,
    /// Display-only annotation carried through from the cart or bulk preview.
    pub supersedes: Option<String>,
}

#[derive(Clone)]
pub struct AllocationService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl AllocationService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Commits an order: allocates stock for every item in submission order,
    /// records the item snapshots, writes the order total, and clears the
    /// submitting user's cart. All-or-nothing.
    ///
    /// Per item: `allocated = min(requested, live free_stock)` (a missing
    /// catalog row counts as zero stock); the decrement carries a
    /// `free_stock >= allocated` guard in its filter so two racing commits
    /// can never jointly drive stock negative. The loser aborts with a
    /// conflict and the whole transaction rolls back.
    #[instrument(skip(self, items), fields(user_id = %user_id, stock_type = %stock_type, item_count = items.len()))]
    pub async fn commit_order(
        &self,
        user_id: Uuid,
        stock_type: &str,
        items: Vec<OrderItemInput>,
    ) -> Result<Uuid, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "order contains no items".to_string(),
            ));
        }

        let item_count = items.len();
        let order_id = Uuid::new_v4();
        let txn = self.db.begin().await?;

        let header = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            stock_type: Set(stock_type.to_string()),
            total_price: Set(Decimal::ZERO),
            status: Set(OrderStatus::Pending),
            created_at: Set(Utc::now()),
        };
        header.insert(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert order header");
            ServiceError::DatabaseError(e)
        })?;

        let mut total = Decimal::ZERO;

        for item in items {
            let row = StockItemEntity::find()
                .filter(stock_item::Column::PartNumber.eq(item.part_number.as_str()))
                .filter(stock_item::Column::StockType.eq(stock_type))
                .filter(stock_item::Column::IsActive.eq(true))
                .one(&txn)
                .await?;

            let current_stock = row.as_ref().map(|r| r.free_stock).unwrap_or(0);
            let allocated = item.requested_qty.min(current_stock).max(0);

            if let (true, Some(row)) = (allocated > 0, row.as_ref()) {
                // Guarded decrement: the filter re-checks the stock level so a
                // concurrent commit that got there first makes this a no-op
                // instead of an over-allocation.
                let result = StockItemEntity::update_many()
                    .col_expr(
                        stock_item::Column::FreeStock,
                        Expr::col(stock_item::Column::FreeStock).sub(allocated),
                    )
                    .filter(stock_item::Column::Id.eq(row.id))
                    .filter(stock_item::Column::FreeStock.gte(allocated))
                    .exec(&txn)
                    .await?;

                if result.rows_affected == 0 {
                    return Err(ServiceError::Conflict(format!(
                        "stock for part {} changed during allocation",
                        item.part_number
                    )));
                }
            }

            let snapshot = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                part_number: Set(item.part_number),
                description: Set(item.description),
                price: Set(item.price),
                requested_qty: Set(item.requested_qty),
                qty: Set(allocated),
                available_qty: Set(current_stock),
                supersedes: Set(item.supersedes),
            };
            snapshot.insert(&txn).await?;

            total += Decimal::from(allocated) * item.price;
        }

        order::Entity::update_many()
            .col_expr(order::Column::TotalPrice, Expr::value(total))
            .filter(order::Column::Id.eq(order_id))
            .exec(&txn)
            .await?;

        CartItemEntity::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, user_id = %user_id, total = %total, "Order committed");
        self.event_sender
            .send_or_log(Event::OrderCommitted {
                order_id,
                user_id,
                item_count,
            })
            .await;

        Ok(order_id)
    }
}
