//! Read-side catalog search plus catalog lifecycle (upload, reset, export).
//!
//! Search runs over the active generation of a stock type only. Matching is
//! forgiving (normalized and raw substring matches over part number,
//! description, and supersession marker) while ordering is strict: exact
//! normalized-prefix matches sort before everything else, ties broken by part
//! number. Prices are adjusted per caller at read time and never written back.

use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::entities::stock_item::{self, Entity as StockItemEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::part_number::{match_key, normalize};
use crate::services::adjusted_price;
use crate::services::supersession::{ReplacementNode, SupersessionResolver};
use crate::tabular::{CatalogRow, StockExportRow};

/// Maximum number of search results returned.
const SEARCH_LIMIT: usize = 50;

/// A search hit with its resolved supersession chain attached for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PartCandidate {
    pub part_number: String,
    pub description: Option<String>,
    pub free_stock: i64,
    /// Caller-adjusted price, rounded to cents.
    pub price: Decimal,
    pub stock_type: String,
    pub superseded_by: Option<String>,
    pub has_supersession: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<ReplacementNode>,
}

#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    resolver: SupersessionResolver,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        let resolver = SupersessionResolver::new(db.clone());
        Self {
            db,
            resolver,
            event_sender,
        }
    }

    /// Searches the active catalog of `stock_type`. Read-only.
    ///
    /// A row matches when the normalized query is a substring of the
    /// normalized part number, the raw query is a substring of the raw part
    /// number, or the normalized query appears in the description or the
    /// supersession marker (all case-insensitive). At most one result per
    /// distinct part number, first match wins, capped at 50.
    #[instrument(skip(self), fields(stock_type = %stock_type))]
    pub async fn search(
        &self,
        query: &str,
        stock_type: &str,
        adjustment_percent: Decimal,
    ) -> Result<Vec<PartCandidate>, ServiceError> {
        let raw_query = query.trim().to_uppercase();
        let key_query = match_key(query);

        let rows = StockItemEntity::find()
            .filter(stock_item::Column::StockType.eq(stock_type))
            .filter(stock_item::Column::IsActive.eq(true))
            .order_by_asc(stock_item::Column::PartNumber)
            .all(&*self.db)
            .await?;

        let mut matches: Vec<stock_item::Model> = rows
            .into_iter()
            .filter(|row| {
                let pn_key = match_key(&row.part_number);
                let pn_raw = row.part_number.to_uppercase();
                pn_key.contains(&key_query)
                    || pn_raw.contains(&raw_query)
                    || row
                        .description
                        .as_deref()
                        .map(|d| d.to_uppercase().contains(&key_query))
                        .unwrap_or(false)
                    || row
                        .superseded_by
                        .as_deref()
                        .map(|s| s.to_uppercase().contains(&key_query))
                        .unwrap_or(false)
            })
            .collect();

        // Rows arrive ordered by part number; a stable sort on the prefix
        // rank alone preserves that as the tie-break.
        matches.sort_by_key(|row| {
            if match_key(&row.part_number).starts_with(&key_query) {
                0u8
            } else {
                1u8
            }
        });

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for row in matches {
            if !seen.insert(row.part_number.clone()) {
                continue;
            }
            if results.len() == SEARCH_LIMIT {
                break;
            }

            let replacement = self
                .resolver
                .resolve_chain(row.superseded_by.as_deref(), stock_type, adjustment_percent, 0)
                .await?;

            results.push(PartCandidate {
                part_number: row.part_number,
                description: row.description,
                free_stock: row.free_stock,
                price: adjusted_price(row.price, adjustment_percent),
                stock_type: row.stock_type,
                has_supersession: replacement.is_some(),
                superseded_by: row.superseded_by,
                replacement,
            });
        }

        Ok(results)
    }

    /// Returns the single active row for `(part_number, stock_type)`, if any.
    pub async fn find_active(
        &self,
        part_number: &str,
        stock_type: &str,
    ) -> Result<Option<stock_item::Model>, ServiceError> {
        StockItemEntity::find()
            .filter(stock_item::Column::PartNumber.eq(part_number))
            .filter(stock_item::Column::StockType.eq(stock_type))
            .filter(stock_item::Column::IsActive.eq(true))
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Replaces the active catalog generation for `stock_type`.
    ///
    /// Deactivates every currently-active row for the stock type and inserts
    /// the uploaded rows as the new active generation, in one transaction.
    /// Previous generations are kept so order item snapshots stay resolvable.
    #[instrument(skip(self, rows), fields(stock_type = %stock_type, row_count = rows.len()))]
    pub async fn replace_catalog(
        &self,
        rows: Vec<CatalogRow>,
        stock_type: &str,
    ) -> Result<usize, ServiceError> {
        let txn = self.db.begin().await?;

        StockItemEntity::update_many()
            .col_expr(stock_item::Column::IsActive, Expr::value(false))
            .filter(stock_item::Column::StockType.eq(stock_type))
            .filter(stock_item::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        let count = rows.len();
        if count > 0 {
            let models = rows.into_iter().map(|row| stock_item::ActiveModel {
                part_number: Set(row.part_number.trim().to_string()),
                description: Set(row.description),
                free_stock: Set(row.free_stock),
                price: Set(row.price),
                superseded_by: Set(row.superseded_by),
                stock_type: Set(stock_type.to_string()),
                is_active: Set(true),
                ..Default::default()
            });

            StockItemEntity::insert_many(models).exec(&txn).await?;
        }

        txn.commit().await?;

        info!(stock_type = %stock_type, row_count = count, "Catalog generation replaced");
        self.event_sender
            .send_or_log(Event::CatalogReplaced {
                stock_type: stock_type.to_string(),
                row_count: count,
            })
            .await;

        Ok(count)
    }

    /// Hard-deletes every generation for `stock_type`. Explicit reset only.
    #[instrument(skip(self), fields(stock_type = %stock_type))]
    pub async fn reset_stock(&self, stock_type: &str) -> Result<u64, ServiceError> {
        let result = StockItemEntity::delete_many()
            .filter(stock_item::Column::StockType.eq(stock_type))
            .exec(&*self.db)
            .await?;

        info!(stock_type = %stock_type, deleted = result.rows_affected, "Stock reset");
        self.event_sender
            .send_or_log(Event::StockReset {
                stock_type: stock_type.to_string(),
            })
            .await;

        Ok(result.rows_affected)
    }

    /// Active `(part_number, description, stock)` triples for export.
    pub async fn stock_export_rows(
        &self,
        stock_type: &str,
    ) -> Result<Vec<StockExportRow>, ServiceError> {
        let rows = StockItemEntity::find()
            .filter(stock_item::Column::StockType.eq(stock_type))
            .filter(stock_item::Column::IsActive.eq(true))
            .order_by_asc(stock_item::Column::PartNumber)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| StockExportRow {
                part_number: row.part_number,
                description: row.description,
                stock: row.free_stock,
            })
            .collect())
    }

    /// Normalized lookup used by callers that accept raw user input.
    pub async fn find_active_normalized(
        &self,
        raw_part_number: &str,
        stock_type: &str,
    ) -> Result<Option<stock_item::Model>, ServiceError> {
        // Exact match on the normalized form wins; otherwise fall back to the
        // hyphen-insensitive match key.
        let normalized = normalize(raw_part_number);
        if let Some(row) = self.find_active(&normalized, stock_type).await? {
            return Ok(Some(row));
        }

        let key = match_key(raw_part_number);
        let rows = StockItemEntity::find()
            .filter(stock_item::Column::StockType.eq(stock_type))
            .filter(stock_item::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .find(|row| match_key(&row.part_number) == key))
    }
}
