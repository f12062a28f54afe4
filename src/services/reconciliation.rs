//! Bulk enquiry reconciliation: the read-only preview twin of the allocation
//! engine.
//!
//! An uploaded part/quantity list is joined against the active catalog and
//! annotated with the same allocation rules a commit would apply, without
//! touching stock. The caller reviews (and may edit) the preview, then
//! re-submits the accepted rows through the allocation engine as the actual
//! commit; previewing never reserves anything.
//!
//! Backorder is always the original part's own shortfall. A superseding part
//! can cover the remainder, but its contribution never reduces the parent
//! row's backorder figure.

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::entities::stock_item::{self, Entity as StockItemEntity};
use crate::errors::ServiceError;
use crate::part_number::match_key;
use crate::services::adjusted_price;
use crate::tabular::BulkRow;

/// Fulfillment status of one reconciled row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RowStatus {
    #[serde(rename = "Fully Allocated")]
    FullyAllocated,
    #[serde(rename = "Partial - Split")]
    PartialSplit,
    #[serde(rename = "Partial")]
    Partial,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
    #[serde(rename = "Superseded fulfillment")]
    SupersededFulfillment,
    #[serde(rename = "Invalid Part")]
    InvalidPart,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullyAllocated => "Fully Allocated",
            Self::PartialSplit => "Partial - Split",
            Self::Partial => "Partial",
            Self::OutOfStock => "Out of Stock",
            Self::SupersededFulfillment => "Superseded fulfillment",
            Self::InvalidPart => "Invalid Part",
        }
    }
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One preview line. A supersession split produces two of these: the parent
/// keeps the input serial, the synthetic child gets `"{serial}.1"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReconciledRow {
    pub serial_no: String,
    /// Part number to display: the catalog row that would fulfill this line,
    /// falling back to the raw input when nothing matched.
    pub part_number: String,
    /// The part number exactly as uploaded.
    pub requested_input: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub available_qty: i64,
    pub requested_qty: i64,
    pub allocated_qty: i64,
    pub back_order: i64,
    pub supersedes: Option<String>,
    pub status: RowStatus,
    pub no_record: bool,
    /// Catalog part number resolved for this line, absent for invalid parts.
    pub resolved_part_number: Option<String>,
}

/// Applies the allocation-and-supersession rules to `rows` against a stock
/// snapshot. Pure; the snapshot is not mutated.
///
/// Supersession here descends exactly one level: only the immediate
/// replacement of the original part is consulted, unlike interactive search
/// which walks the whole chain.
pub fn reconcile_rows(
    rows: &[BulkRow],
    snapshot: &[stock_item::Model],
    adjustment_percent: Decimal,
) -> Vec<ReconciledRow> {
    // First occurrence wins in both maps, mirroring the dedup order of the
    // catalog itself.
    let mut by_part: HashMap<&str, &stock_item::Model> = HashMap::new();
    let mut by_key: HashMap<String, &stock_item::Model> = HashMap::new();
    for item in snapshot {
        by_part.entry(item.part_number.as_str()).or_insert(item);
        by_key.entry(match_key(&item.part_number)).or_insert(item);
    }

    let price_of = |item: &stock_item::Model| -> Decimal {
        if adjustment_percent.is_zero() {
            item.price
        } else {
            adjusted_price(item.price, adjustment_percent)
        }
    };

    let lookup = |raw: &str| -> Option<&stock_item::Model> {
        let trimmed = raw.trim();
        by_part
            .get(trimmed)
            .copied()
            .or_else(|| by_key.get(&match_key(trimmed)).copied())
    };

    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let matched = lookup(&row.part_number);

        let matched = match matched {
            None => {
                out.push(ReconciledRow {
                    serial_no: row.serial_no.clone(),
                    part_number: row.part_number.clone(),
                    requested_input: row.part_number.clone(),
                    description: None,
                    price: Decimal::ZERO,
                    available_qty: 0,
                    requested_qty: row.requested_qty,
                    allocated_qty: 0,
                    back_order: row.requested_qty,
                    supersedes: None,
                    status: RowStatus::InvalidPart,
                    no_record: true,
                    resolved_part_number: None,
                });
                continue;
            }
            Some(m) => m,
        };

        let available = matched.free_stock;
        let requested = row.requested_qty;
        let alloc_orig = requested.min(available);
        // Always the original part's own deficit, even when a superseding
        // part covers the remainder below.
        let back_order_orig = (requested - alloc_orig).max(0);
        let remainder = requested - alloc_orig;

        let sup_display = matched
            .superseded_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let replacement = if remainder > 0 {
            sup_display.as_deref().and_then(|s| lookup(s))
        } else {
            None
        };

        if remainder <= 0 {
            out.push(ReconciledRow {
                serial_no: row.serial_no.clone(),
                part_number: matched.part_number.clone(),
                requested_input: row.part_number.clone(),
                description: matched.description.clone(),
                price: price_of(matched),
                available_qty: available,
                requested_qty: requested,
                allocated_qty: alloc_orig,
                back_order: 0,
                supersedes: sup_display,
                status: RowStatus::FullyAllocated,
                no_record: false,
                resolved_part_number: Some(matched.part_number.clone()),
            });
        } else if let Some(sup) = replacement.filter(|sup| sup.free_stock > 0) {
            out.push(ReconciledRow {
                serial_no: row.serial_no.clone(),
                part_number: matched.part_number.clone(),
                requested_input: row.part_number.clone(),
                description: matched.description.clone(),
                price: price_of(matched),
                available_qty: available,
                requested_qty: requested,
                allocated_qty: alloc_orig,
                back_order: back_order_orig,
                supersedes: sup_display,
                status: if alloc_orig > 0 {
                    RowStatus::PartialSplit
                } else {
                    RowStatus::OutOfStock
                },
                no_record: false,
                resolved_part_number: Some(matched.part_number.clone()),
            });

            let alloc_sup = remainder.min(sup.free_stock);
            out.push(ReconciledRow {
                serial_no: format!("{}.1", row.serial_no),
                part_number: sup.part_number.clone(),
                requested_input: row.part_number.clone(),
                description: Some(format!(
                    "(Superseded) {}",
                    sup.description.as_deref().unwrap_or_default()
                )),
                price: price_of(sup),
                available_qty: sup.free_stock,
                requested_qty: 0,
                allocated_qty: alloc_sup,
                back_order: 0,
                supersedes: None,
                status: RowStatus::SupersededFulfillment,
                no_record: false,
                resolved_part_number: Some(sup.part_number.clone()),
            });
        } else {
            out.push(ReconciledRow {
                serial_no: row.serial_no.clone(),
                part_number: matched.part_number.clone(),
                requested_input: row.part_number.clone(),
                description: matched.description.clone(),
                price: price_of(matched),
                available_qty: available,
                requested_qty: requested,
                allocated_qty: alloc_orig,
                back_order: back_order_orig,
                supersedes: sup_display,
                status: if alloc_orig > 0 {
                    RowStatus::Partial
                } else {
                    RowStatus::OutOfStock
                },
                no_record: false,
                resolved_part_number: Some(matched.part_number.clone()),
            });
        }
    }

    // Serial ascending keeps a parent and its ".1" child adjacent; the
    // descending status tie-break keeps them correctly ordered when serials
    // collide.
    out.sort_by(|a, b| {
        a.serial_no
            .cmp(&b.serial_no)
            .then_with(|| b.status.as_str().cmp(a.status.as_str()))
    });

    out
}

/// Read-only bulk preview over the live catalog.
#[derive(Clone)]
pub struct BulkReconciliationService {
    db: Arc<DatabaseConnection>,
}

impl BulkReconciliationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Loads the active stock snapshot for `stock_type` once and reconciles
    /// the uploaded rows against it. Does not mutate stock.
    #[instrument(skip(self, rows), fields(stock_type = %stock_type, row_count = rows.len()))]
    pub async fn reconcile(
        &self,
        rows: &[BulkRow],
        stock_type: &str,
        adjustment_percent: Decimal,
    ) -> Result<Vec<ReconciledRow>, ServiceError> {
        let snapshot = StockItemEntity::find()
            .filter(stock_item::Column::StockType.eq(stock_type))
            .filter(stock_item::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        Ok(reconcile_rows(rows, &snapshot, adjustment_percent))
    }
}
