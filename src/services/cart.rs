//! Cart management.
//!
//! Cart lines snapshot their price at add time; availability shown against a
//! cart is always re-read live, and the authoritative allocation only happens
//! at checkout. Cart mutations are last-writer-wins with no optimistic
//! concurrency check.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::cart_item::{self, Entity as CartItemEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::part_number::normalize;
use crate::services::catalog::CatalogService;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddToCartInput {
    pub user_id: Uuid,
    pub part_number: String,
    pub description: Option<String>,
    pub requested_qty: i64,
    pub price: Decimal,
    /// Display-only grouping hint recording which parent part this replaces.
    pub supersedes: Option<String>,
}

/// A cart line annotated with a live-availability allocation preview.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartLineView {
    pub id: Uuid,
    pub part_number: String,
    pub description: Option<String>,
    pub requested_qty: i64,
    pub price: Decimal,
    pub supersedes: Option<String>,
    pub available_qty: i64,
    pub allocated_qty: i64,
    pub back_order: i64,
    pub status: String,
}

#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    catalog: Arc<CatalogService>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        catalog: Arc<CatalogService>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            catalog,
            event_sender,
        }
    }

    /// Adds a line, merging into an existing line for the same part number by
    /// summing quantities. The part number is normalized before storage.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, part_number = %input.part_number))]
    pub async fn add_item(&self, input: AddToCartInput) -> Result<cart_item::Model, ServiceError> {
        if input.requested_qty <= 0 {
            return Err(ServiceError::InvalidInput(
                "requested quantity must be positive".to_string(),
            ));
        }

        let part_number = normalize(&input.part_number);
        if part_number.is_empty() {
            return Err(ServiceError::InvalidInput(
                "part number must not be empty".to_string(),
            ));
        }

        let existing = CartItemEntity::find()
            .filter(cart_item::Column::UserId.eq(input.user_id))
            .filter(cart_item::Column::PartNumber.eq(part_number.as_str()))
            .one(&*self.db)
            .await?;

        let model = if let Some(line) = existing {
            let merged_qty = line.requested_qty + input.requested_qty;
            let mut line: cart_item::ActiveModel = line.into();
            line.requested_qty = Set(merged_qty);
            line.update(&*self.db).await?
        } else {
            let line = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(input.user_id),
                part_number: Set(part_number.clone()),
                description: Set(input.description),
                requested_qty: Set(input.requested_qty),
                price: Set(input.price),
                supersedes: Set(input.supersedes),
                created_at: Set(Utc::now()),
            };
            line.insert(&*self.db).await?
        };

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                user_id: input.user_id,
                part_number,
            })
            .await;

        Ok(model)
    }

    /// Lists the user's cart, newest first, each line annotated with live
    /// availability and the allocation the engine would make right now.
    #[instrument(skip(self), fields(user_id = %user_id, stock_type = %stock_type))]
    pub async fn list(
        &self,
        user_id: Uuid,
        stock_type: &str,
    ) -> Result<Vec<CartLineView>, ServiceError> {
        let lines = CartItemEntity::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_desc(cart_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut views = Vec::with_capacity(lines.len());
        for line in lines {
            // Normalized lookup so a line stored without hyphens still finds
            // its hyphenated catalog row.
            let live = self
                .catalog
                .find_active_normalized(&line.part_number, stock_type)
                .await?;

            let available = live.map(|s| s.free_stock).unwrap_or(0);
            let requested = line.requested_qty;
            let allocated = requested.min(available).max(0);
            let status = if available >= requested {
                "Fully Allocated"
            } else if available > 0 {
                "Partial Fulfillment"
            } else {
                "Out of Stock"
            };

            views.push(CartLineView {
                id: line.id,
                part_number: line.part_number,
                description: line.description,
                requested_qty: requested,
                price: line.price,
                supersedes: line.supersedes,
                available_qty: available,
                allocated_qty: allocated,
                back_order: (requested - available).max(0),
                status: status.to_string(),
            });
        }

        Ok(views)
    }

    /// Overwrites a line's quantity. Last writer wins.
    #[instrument(skip(self), fields(cart_item_id = %cart_item_id))]
    pub async fn update_qty(
        &self,
        cart_item_id: Uuid,
        new_qty: i64,
    ) -> Result<cart_item::Model, ServiceError> {
        if new_qty <= 0 {
            return Err(ServiceError::InvalidInput(
                "requested quantity must be positive".to_string(),
            ));
        }

        let line = CartItemEntity::find_by_id(cart_item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Cart item {} not found", cart_item_id))
            })?;

        let mut line: cart_item::ActiveModel = line.into();
        line.requested_qty = Set(new_qty);
        Ok(line.update(&*self.db).await?)
    }

    #[instrument(skip(self), fields(cart_item_id = %cart_item_id))]
    pub async fn remove(&self, cart_item_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItemEntity::delete_by_id(cart_item_id)
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Cart item {} not found",
                cart_item_id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result = CartItemEntity::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        info!(user_id = %user_id, removed = result.rows_affected, "Cart cleared");
        self.event_sender.send_or_log(Event::CartCleared(user_id)).await;

        Ok(result.rows_affected)
    }
}
