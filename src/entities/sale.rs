use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an in-store sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SalePaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

impl SalePaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
        }
    }
}

/// Lifecycle of an in-store sale. Cash sales are born `completed`; transfer
/// sales stay `transfer_pending` until an admin confirms the bank transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum SaleStatus {
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "transfer_pending")]
    TransferPending,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::TransferPending => "transfer_pending",
        }
    }
}

/// In-store sale header. Written once, together with its line items, the
/// stock decrement and the financial movement; the only later mutation is
/// the transfer-confirmation workflow.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub sale_number: String,

    pub employee_id: Uuid,
    pub sold_at: DateTime<Utc>,

    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,

    pub payment_method: SalePaymentMethod,
    pub status: SaleStatus,

    // Cash payments only
    pub cash_received: Option<Decimal>,
    pub change_given: Option<Decimal>,

    // Transfer payments only
    pub transfer_voucher: Option<String>,
    pub bank_reference: Option<String>,
    pub transfer_amount: Option<Decimal>,
    pub transfer_confirmed: bool,
    pub transfer_confirmed_by: Option<Uuid>,
    pub transfer_confirmed_at: Option<DateTime<Utc>>,

    // Walk-in customer snapshot
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sale_item::Entity")]
    SaleItems,
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItems.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_transfer(&self) -> bool {
        self.payment_method == SalePaymentMethod::Transfer
    }
}
