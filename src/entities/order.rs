use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One requested part tied to a reception and a customer.
///
/// `car_name` is a deliberate denormalized copy of the owning reception's
/// car name, fixed when the reception's first order is created and reused
/// verbatim for later appends. `description` accumulates status-change
/// annotations and is never overwritten.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub reception_id: i32,
    pub order_number: String,
    pub piece_name: Option<String>,
    pub part_id: Option<String>,
    pub number_of_pieces: Option<i32>,
    pub order_channel: String,
    pub market_name: Option<String>,
    pub market_phone: Option<String>,
    /// System-assigned at creation, shop-local time.
    pub order_date: DateTime,
    /// Set only when the order transitions into the received state.
    pub delivery_date: Option<DateTime>,
    pub estimated_arrival_days: Option<i32>,
    pub estimated_arrival_date: Option<DateTime>,
    pub status: String,
    pub final_order_number: Option<String>,
    pub description: Option<String>,
    pub all_description: Option<String>,
    pub car_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reception::Entity",
        from = "Column::ReceptionId",
        to = "super::reception::Column::Id"
    )]
    Reception,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
}

impl Related<super::reception::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reception.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
