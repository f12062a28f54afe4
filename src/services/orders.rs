//! Order ledger: reads over committed orders and the reversal path that
//! restores stock when an order is rejected or deleted.
//!
//! Reversal adds back each item's allocated quantity (`qty`), never the
//! requested quantity. The status guard makes rejection a one-shot: stock is
//! restored only on a transition into Rejected from a non-Rejected state.
//! Deletion restores unconditionally since the order ceases to exist.

use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{
    order::{self, Entity as OrderEntity, OrderStatus},
    order_item::{self, Entity as OrderItemEntity},
    stock_item::{self, Entity as StockItemEntity},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::tabular::OrderExportRow;

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// All orders, newest first.
    pub async fn list_orders(&self) -> Result<Vec<order::Model>, ServiceError> {
        OrderEntity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<order::Model>, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    pub async fn order_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<order_item::Model>, ServiceError> {
        OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// One user's order history, newest first.
    pub async fn user_orders(&self, user_id: Uuid) -> Result<Vec<order::Model>, ServiceError> {
        OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Export rows (standard order-item column set) for one order.
    pub async fn order_export_rows(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderExportRow>, ServiceError> {
        let items = self.order_items(order_id).await?;
        Ok(items
            .into_iter()
            .map(|item| OrderExportRow {
                part_number: item.part_number,
                description: item.description,
                price: item.price,
                requested_qty: item.requested_qty,
                allocated_qty: item.qty,
                available_qty: item.available_qty,
                supersedes: item.supersedes,
            })
            .collect())
    }

    /// Transitions an order's status.
    ///
    /// Stock is restored exactly when the order moves into Rejected from a
    /// non-Rejected state. Every other transition leaves stock untouched;
    /// re-accepting a rejected order does not re-deduct.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = ?new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let current = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = current.status;
        let restore = old_status != OrderStatus::Rejected && new_status == OrderStatus::Rejected;
        if restore {
            restore_stock(&txn, order_id).await?;
        }

        let mut active: order::ActiveModel = current.into();
        active.status = Set(new_status);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, ?old_status, ?new_status, restored = restore, "Order status updated");
        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            })
            .await;
        if restore {
            self.event_sender
                .send_or_log(Event::StockRestored { order_id })
                .await;
        }

        Ok(updated)
    }

    /// Deletes an order, restoring its allocated stock first. The restore is
    /// unconditional: this is a one-shot operation because the order record
    /// is gone afterwards.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let exists = OrderEntity::find_by_id(order_id).one(&txn).await?;
        if exists.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                order_id
            )));
        }

        restore_stock(&txn, order_id).await?;

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        OrderEntity::delete_by_id(order_id).exec(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, "Order deleted and stock restored");
        self.event_sender.send_or_log(Event::OrderDeleted(order_id)).await;

        Ok(())
    }

    /// Wipes every order for a stock type, restoring stock once per order
    /// that is not already Rejected (rejected orders were restored at
    /// rejection time and must not be restored again).
    #[instrument(skip(self), fields(stock_type = %stock_type))]
    pub async fn delete_all_orders(&self, stock_type: &str) -> Result<u64, ServiceError> {
        let txn = self.db.begin().await?;

        let orders = OrderEntity::find()
            .filter(order::Column::StockType.eq(stock_type))
            .all(&txn)
            .await?;

        for header in &orders {
            if header.status != OrderStatus::Rejected {
                restore_stock(&txn, header.id).await?;
            }
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.is_in(ids.clone()))
            .exec(&txn)
            .await?;
        let deleted = OrderEntity::delete_many()
            .filter(order::Column::Id.is_in(ids))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(stock_type = %stock_type, deleted = deleted.rows_affected, "All orders deleted and stock restored");
        Ok(deleted.rows_affected)
    }

    /// Wipes the entire order history across stock types, restoring stock
    /// once per non-Rejected order.
    #[instrument(skip(self))]
    pub async fn delete_all_history(&self) -> Result<u64, ServiceError> {
        let txn = self.db.begin().await?;

        let orders = OrderEntity::find()
            .filter(order::Column::Status.ne(OrderStatus::Rejected))
            .all(&txn)
            .await?;
        for header in &orders {
            restore_stock(&txn, header.id).await?;
        }

        OrderItemEntity::delete_many().exec(&txn).await?;
        let deleted = OrderEntity::delete_many().exec(&txn).await?;

        txn.commit().await?;

        info!(deleted = deleted.rows_affected, "Order history wiped, stock restored where applicable");
        Ok(deleted.rows_affected)
    }
}

/// Adds back the allocated quantity (`qty`) of every item under `order_id`
/// to the active stock row of the order's stock type.
///
/// Must run inside the caller's transaction so the restore commits or rolls
/// back together with the status change or deletion that triggered it.
pub async fn restore_stock(
    txn: &DatabaseTransaction,
    order_id: Uuid,
) -> Result<(), ServiceError> {
    let header = OrderEntity::find_by_id(order_id).one(txn).await?;
    let header = match header {
        Some(h) => h,
        None => {
            warn!(order_id = %order_id, "Restore requested for missing order header");
            return Ok(());
        }
    };

    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(txn)
        .await?;

    for item in items {
        if item.qty > 0 {
            let result = StockItemEntity::update_many()
                .col_expr(
                    stock_item::Column::FreeStock,
                    Expr::col(stock_item::Column::FreeStock).add(item.qty),
                )
                .filter(stock_item::Column::PartNumber.eq(item.part_number.as_str()))
                .filter(stock_item::Column::StockType.eq(header.stock_type.as_str()))
                .filter(stock_item::Column::IsActive.eq(true))
                .exec(txn)
                .await?;

            // The row may have been retired by a later catalog upload or a
            // stock reset; the quantity is dropped rather than resurrected.
            if result.rows_affected == 0 {
                warn!(
                    order_id = %order_id,
                    part_number = %item.part_number,
                    qty = item.qty,
                    "No active stock row to restore to, quantity dropped"
                );
            }
        }
    }

    Ok(())
}
