//! Payment entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub transaction_id: i32,

    pub payment_type_id: i32,
    pub amount_cents: i64,
    pub currency: String,

    #[sea_orm(nullable)]
    pub reference_number: Option<String>,

    /// COMPLETED | REFUNDED
    pub status: String,

    pub operator_id: i32,
    pub paid_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub notes: Option<String>,

    #[sea_orm(nullable)]
    pub refund_amount_cents: Option<i64>,
    #[sea_orm(nullable)]
    pub refund_date: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub refund_reason: Option<String>,
    #[sea_orm(nullable)]
    pub refunded_by: Option<i32>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parking_transaction::Entity",
        from = "Column::TransactionId",
        to = "super::parking_transaction::Column::Id"
    )]
    Transaction,
}

impl Related<super::parking_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
