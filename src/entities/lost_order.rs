use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bookkeeping record materialized when an order enters a cancellation or
/// non-payment state. Written once, never mutated.
///
/// `count`, `lost_date` and `lost_time` are descriptive fields: the count is
/// stored as text and the loss moment is split into a local date plus an
/// `HH:MM` string, matching the reporting layer that consumes this table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lost_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub part_id: Option<String>,
    pub piece_name: String,
    pub car_name: String,
    pub lost_description: String,
    pub count: String,
    pub lost_date: Date,
    pub lost_time: String,
    pub status: String,
    pub dealer_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
