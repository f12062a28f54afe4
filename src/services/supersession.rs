//! Supersession chain resolution.
//!
//! A catalog row may declare a replacement part via its `superseded_by`
//! marker. The resolver walks that declaration recursively, producing a
//! singly-linked chain of alternative parts, each carrying its own live stock
//! and caller-adjusted price. Traversal stops at the first part without a
//! marker or at [`MAX_CHAIN_DEPTH`], so cyclic data cannot hang a request.

use async_recursion::async_recursion;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::entities::stock_item::{self, Entity as StockItemEntity};
use crate::errors::ServiceError;
use crate::services::adjusted_price;

/// Depth at which chain traversal gives up. Keeps resolution terminating
/// even when the data contains a supersession cycle.
pub const MAX_CHAIN_DEPTH: u8 = 5;

/// One link in a supersession chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReplacementNode {
    pub part_number: String,
    pub description: Option<String>,
    pub free_stock: i64,
    /// Caller-adjusted price, rounded to cents.
    pub price: Decimal,
    pub superseded_by: Option<String>,
    /// The replacement's own replacement, when it declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_replacement: Option<Box<ReplacementNode>>,
}

/// Resolves declared replacement chains against the active catalog.
#[derive(Clone)]
pub struct SupersessionResolver {
    db: Arc<DatabaseConnection>,
}

impl SupersessionResolver {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Resolves the chain declared by `marker` within `stock_type`.
    ///
    /// Returns `None` for a blank marker, a marker with no active catalog
    /// row, or when `depth` exceeds [`MAX_CHAIN_DEPTH`].
    #[async_recursion]
    pub async fn resolve_chain(
        &self,
        marker: Option<&str>,
        stock_type: &str,
        adjustment_percent: Decimal,
        depth: u8,
    ) -> Result<Option<ReplacementNode>, ServiceError> {
        if depth > MAX_CHAIN_DEPTH {
            return Ok(None);
        }

        let marker = match marker.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => m,
            None => return Ok(None),
        };

        let row = StockItemEntity::find()
            .filter(stock_item::Column::PartNumber.eq(marker))
            .filter(stock_item::Column::StockType.eq(stock_type))
            .filter(stock_item::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?;

        let row = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let nested = self
            .resolve_chain(
                row.superseded_by.as_deref(),
                stock_type,
                adjustment_percent,
                depth + 1,
            )
            .await?;

        Ok(Some(ReplacementNode {
            part_number: row.part_number,
            description: row.description,
            free_stock: row.free_stock,
            price: adjusted_price(row.price, adjustment_percent),
            superseded_by: row.superseded_by,
            nested_replacement: nested.map(Box::new),
        }))
    }
}
