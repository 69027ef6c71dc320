use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::financial_movement::ReferenceType;

/// Audit row written exactly once per confirmed bank transfer. Its
/// existence is the audit trail; rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transfer_confirmations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// The confirmed aggregate: a sale or an order, never both.
    pub reference_id: Uuid,
    pub reference_type: ReferenceType,

    pub voucher: String,
    pub bank_reference: Option<String>,
    pub amount: Decimal,

    pub confirmed_by: Uuid,
    pub confirmed_at: DateTime<Utc>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}
