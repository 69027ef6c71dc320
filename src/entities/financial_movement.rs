use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Money-event direction. The fulfillment core only appends `income`
/// entries; `expense` belongs to the recurring-expense processing that
/// consumes this table from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MovementType {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Channel + payment-state bucket used by downstream reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(48))")]
pub enum MovementCategory {
    #[sea_orm(string_value = "local_cash_sale")]
    LocalCashSale,
    #[sea_orm(string_value = "local_transfer_pending")]
    LocalTransferPending,
    #[sea_orm(string_value = "local_transfer_confirmed")]
    LocalTransferConfirmed,
    #[sea_orm(string_value = "store_sale_completed")]
    StoreSaleCompleted,
    #[sea_orm(string_value = "store_transfer_pending")]
    StoreTransferPending,
    #[sea_orm(string_value = "store_transfer_confirmed")]
    StoreTransferConfirmed,
}

impl MovementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalCashSale => "local_cash_sale",
            Self::LocalTransferPending => "local_transfer_pending",
            Self::LocalTransferConfirmed => "local_transfer_confirmed",
            Self::StoreSaleCompleted => "store_sale_completed",
            Self::StoreTransferPending => "store_transfer_pending",
            Self::StoreTransferConfirmed => "store_transfer_confirmed",
        }
    }

    pub fn is_transfer_pending(&self) -> bool {
        matches!(self, Self::LocalTransferPending | Self::StoreTransferPending)
    }

    /// Category a pending-transfer entry moves to once the transfer is
    /// confirmed. `None` for categories that are not pending transfers.
    pub fn confirmed_variant(&self) -> Option<Self> {
        match self {
            Self::LocalTransferPending => Some(Self::LocalTransferConfirmed),
            Self::StoreTransferPending => Some(Self::StoreTransferConfirmed),
            _ => None,
        }
    }
}

/// Which aggregate a movement (or a transfer confirmation) points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReferenceType {
    #[sea_orm(string_value = "local_sale")]
    LocalSale,
    #[sea_orm(string_value = "store_order")]
    StoreOrder,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalSale => "local_sale",
            Self::StoreOrder => "store_order",
        }
    }
}

/// Application-level tagged union behind the `(reference_id,
/// reference_type)` column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementReference {
    Sale(Uuid),
    Order(Uuid),
}

impl MovementReference {
    pub fn reference_type(&self) -> ReferenceType {
        match self {
            Self::Sale(_) => ReferenceType::LocalSale,
            Self::Order(_) => ReferenceType::StoreOrder,
        }
    }

    pub fn reference_id(&self) -> Uuid {
        match self {
            Self::Sale(id) | Self::Order(id) => *id,
        }
    }
}

/// Financial movement log row. Append-only, with one exception: confirming
/// a pending transfer rewrites `category` and `description` in place.
/// `amount` is never updated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub movement_type: MovementType,
    pub category: MovementCategory,
    pub description: String,
    pub amount: Decimal,
    pub payment_method: String,

    pub reference_id: Uuid,
    pub reference_type: ReferenceType,

    pub registered_by: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn reference(&self) -> MovementReference {
        match self.reference_type {
            ReferenceType::LocalSale => MovementReference::Sale(self.reference_id),
            ReferenceType::StoreOrder => MovementReference::Order(self.reference_id),
        }
    }
}
