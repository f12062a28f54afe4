use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One catalog generation row.
///
/// A catalog upload deactivates the previous generation for its stock type
/// and inserts fresh rows, so at most one row per `(part_number, stock_type)`
/// is active at a time while historical order snapshots stay resolvable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parts_stock")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub part_number: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    /// Authoritative available quantity. Never negative; the allocation
    /// engine guards the decrement.
    pub free_stock: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price: Decimal,
    /// Part number of the declared replacement within the same stock type.
    #[sea_orm(nullable)]
    pub superseded_by: Option<String>,
    pub stock_type: String,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
