//! Parking transaction entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub vehicle_id: i32,
    pub customer_id: i32,
    pub parking_id: i32,
    pub zone_id: i32,
    pub space_id: i32,
    pub plate_number: String,

    pub entry_document_type: String,
    pub entry_document_number: String,
    #[sea_orm(nullable)]
    pub exit_document_type: Option<String>,
    #[sea_orm(nullable)]
    pub exit_document_number: Option<String>,

    pub entry_time: DateTimeUtc,
    #[sea_orm(nullable)]
    pub exit_time: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub duration_minutes: Option<i64>,

    // Money in minor units
    #[sea_orm(nullable)]
    pub calculated_amount_cents: Option<i64>,
    pub discount_amount_cents: i64,
    #[sea_orm(nullable)]
    pub total_amount_cents: Option<i64>,
    pub currency: String,

    /// JSON array of rate ids applied at exit
    #[sea_orm(nullable)]
    pub rate_ids: Option<String>,
    /// JSON array of billed sub-intervals
    #[sea_orm(nullable)]
    pub tariff_breakdown: Option<String>,

    /// ACTIVE | COMPLETED | CANCELLED
    pub status: String,
    /// UNPAID | PAID | REFUNDED
    pub payment_status: String,

    pub entry_method: String,
    #[sea_orm(nullable)]
    pub entry_photo_url: Option<String>,
    #[sea_orm(nullable)]
    pub entry_plate_confidence: Option<f64>,
    #[sea_orm(nullable)]
    pub exit_method: Option<String>,
    #[sea_orm(nullable)]
    pub exit_photo_url: Option<String>,
    #[sea_orm(nullable)]
    pub exit_plate_confidence: Option<f64>,

    pub entry_operator_id: i32,
    #[sea_orm(nullable)]
    pub exit_operator_id: Option<i32>,

    #[sea_orm(nullable)]
    pub notes: Option<String>,
    #[sea_orm(nullable)]
    pub cancellation_reason: Option<String>,
    #[sea_orm(nullable)]
    pub cancelled_by: Option<i32>,
    #[sea_orm(nullable)]
    pub cancelled_at: Option<DateTimeUtc>,

    pub receipt_sent: bool,
    #[sea_orm(nullable)]
    pub receipt_sent_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub receipt_email_status: Option<String>,
    #[sea_orm(nullable)]
    pub receipt_whatsapp_status: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::space::Entity",
        from = "Column::SpaceId",
        to = "super::space::Column::Id"
    )]
    Space,
    #[sea_orm(has_one = "super::payment::Entity")]
    Payment,
}

impl Related<super::space::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Space.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
