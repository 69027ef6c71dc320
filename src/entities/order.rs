use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fulfillment channel for an online order. Decides which branch of the
/// status machine applies after `preparing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DeliveryType {
    #[sea_orm(string_value = "pickup")]
    Pickup,
    #[sea_orm(string_value = "delivery")]
    Delivery,
    #[sea_orm(string_value = "express")]
    Express,
}

impl DeliveryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
            Self::Express => "express",
        }
    }

    /// Delivery and express share the packed/shipped/delivered branch.
    pub fn is_shipped_channel(&self) -> bool {
        matches!(self, Self::Delivery | Self::Express)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "preparing")]
    Preparing,
    #[sea_orm(string_value = "ready_pickup")]
    ReadyPickup,
    #[sea_orm(string_value = "packed")]
    Packed,
    #[sea_orm(string_value = "picked_up")]
    PickedUp,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::ReadyPickup => "ready_pickup",
            Self::Packed => "packed",
            Self::PickedUp => "picked_up",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// States where the goods reached the customer.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Delivered | Self::PickedUp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OrderPaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "transfer_on_delivery")]
    TransferOnDelivery,
}

impl OrderPaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
            Self::TransferOnDelivery => "transfer_on_delivery",
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer | Self::TransferOnDelivery)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

/// Shipping destination for delivery/express orders. Persisted as a JSON
/// column on the order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Online order header.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub order_number: String,

    /// Owning customer account; `None` for guest checkouts.
    pub customer_id: Option<Uuid>,

    pub delivery_type: DeliveryType,
    pub status: OrderStatus,

    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,

    pub payment_method: OrderPaymentMethod,
    pub payment_status: PaymentStatus,

    pub transfer_voucher: Option<String>,
    pub bank_reference: Option<String>,
    pub transfer_amount: Option<Decimal>,
    pub transfer_confirmed: bool,
    pub transfer_confirmed_by: Option<Uuid>,
    pub transfer_confirmed_at: Option<DateTime<Utc>>,

    /// Delivery/express only
    pub shipping_address: Option<Json>,
    pub tracking_number: Option<String>,
    pub estimated_delivery_date: Option<NaiveDate>,

    /// Pickup only
    pub pickup_date: Option<NaiveDate>,
    pub pickup_time_slot: Option<String>,
    pub estimated_pickup_date: Option<NaiveDate>,

    pub requires_confirmation: bool,
    pub confirmed_by: Option<Uuid>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,

    /// Append-only note log, see `models::notes_log`.
    pub notes: Option<String>,

    pub placed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Deserialized shipping address, when one was recorded.
    pub fn shipping_address(&self) -> Option<ShippingAddress> {
        self.shipping_address
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
