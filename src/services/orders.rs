use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{self, Capability, StaffContext},
    entities::financial_movement::{MovementCategory, MovementReference},
    entities::order::{
        self, DeliveryType, Entity as OrderEntity, OrderPaymentMethod, OrderStatus, PaymentStatus,
        ShippingAddress,
    },
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::product,
    errors::ServiceError,
    events::{Event, EventSender},
    models::notes_log::{self, NoteEntry},
    services::finance::{FinanceService, RecordIncome},
    services::inventory::InventoryService,
    services::order_status,
    services::pricing::{self, LineInput},
};

const ORDER_NUMBER_PREFIX: &str = "WEB";
const MIN_VOUCHER_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    /// Owning customer account; `None` for guest checkouts.
    pub customer_id: Option<Uuid>,
    pub delivery_type: DeliveryType,
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<OrderItemInput>,
    pub payment_method: OrderPaymentMethod,
    #[serde(default)]
    pub discount_amount: Decimal,
    /// Required for delivery/express orders.
    pub shipping_address: Option<ShippingAddress>,
    /// Required for pickup orders.
    pub pickup_date: Option<NaiveDate>,
    pub pickup_time_slot: Option<String>,
    /// Required when paying by upfront transfer.
    pub transfer_voucher: Option<String>,
    pub bank_reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmOrderRequest {
    /// Estimated delivery date (delivery/express) or pickup date (pickup).
    pub estimated_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub new_status: OrderStatus,
    pub notes: Option<String>,
    /// Required when moving to `shipped`.
    pub tracking_number: Option<String>,
}

/// An order with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Online order creation and fulfillment orchestration.
///
/// Status transitions are validated against the per-channel table in
/// `order_status` before any mutation; each call commits all its writes in
/// one transaction.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    inventory: Arc<InventoryService>,
    finance: Arc<FinanceService>,
    event_sender: Option<EventSender>,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        inventory: Arc<InventoryService>,
        finance: Arc<FinanceService>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            inventory,
            finance,
            event_sender,
        }
    }

    /// Creates a pending order, reserving stock for every line item.
    #[instrument(skip(self, ctx, request), fields(employee_id = %ctx.employee_id, delivery_type = request.delivery_type.as_str()))]
    pub async fn create_order(
        &self,
        ctx: &StaffContext,
        request: CreateOrderRequest,
    ) -> Result<OrderDetail, ServiceError> {
        auth::require(ctx, Capability::CreateOrder)?;
        request.validate()?;
        Self::validate_channel_fields(&request)?;

        let is_upfront_transfer = request.payment_method == OrderPaymentMethod::Transfer;
        let voucher = request.transfer_voucher.as_deref().map(str::trim);
        if is_upfront_transfer {
            match voucher {
                Some(v) if v.len() >= MIN_VOUCHER_LEN => {}
                _ => {
                    return Err(ServiceError::ValidationError(format!(
                        "transfer voucher description must be at least {} characters",
                        MIN_VOUCHER_LEN
                    )))
                }
            }
        }

        let products = self.fetch_active_products(&request.items).await?;
        let cart = Self::price_items(&request.items, &products, request.discount_amount)?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order_number = self.next_order_number(&txn, now).await?;

        let shipping_address = match &request.shipping_address {
            Some(addr) => Some(
                serde_json::to_value(addr)
                    .map_err(|e| ServiceError::InternalError(e.to_string()))?,
            ),
            None => None,
        };

        let notes = request
            .notes
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(|n| notes_log::append(None, &NoteEntry::new(ctx.employee_id.to_string(), n)));

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            customer_id: Set(request.customer_id),
            delivery_type: Set(request.delivery_type),
            status: Set(OrderStatus::Pending),
            subtotal: Set(cart.subtotal),
            discount_amount: Set(cart.discount_amount),
            tax_amount: Set(cart.tax_amount),
            total_amount: Set(cart.total_amount),
            payment_method: Set(request.payment_method),
            payment_status: Set(PaymentStatus::Pending),
            transfer_voucher: Set(if is_upfront_transfer {
                voucher.map(str::to_string)
            } else {
                None
            }),
            bank_reference: Set(request.bank_reference.clone()),
            transfer_amount: Set(is_upfront_transfer.then_some(cart.total_amount)),
            transfer_confirmed: Set(false),
            transfer_confirmed_by: Set(None),
            transfer_confirmed_at: Set(None),
            shipping_address: Set(shipping_address),
            tracking_number: Set(None),
            estimated_delivery_date: Set(None),
            pickup_date: Set(request.pickup_date),
            pickup_time_slot: Set(request.pickup_time_slot.clone()),
            estimated_pickup_date: Set(None),
            requires_confirmation: Set(true),
            confirmed_by: Set(None),
            confirmed_at: Set(None),
            processed_by: Set(None),
            processed_at: Set(None),
            delivery_date: Set(None),
            notes: Set(notes),
            placed_at: Set(now),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(1),
        }
        .insert(&txn)
        .await?;

        let (items, reserved) = self.insert_items_and_reserve(&txn, order_id, &cart).await?;

        // An upfront transfer is recorded as pending revenue right away;
        // every other payment method is recorded when the goods reach the
        // customer.
        if is_upfront_transfer {
            self.finance
                .record_income(
                    &txn,
                    RecordIncome {
                        category: MovementCategory::StoreTransferPending,
                        description: format!(
                            "Store order {} awaiting bank verification",
                            order_number
                        ),
                        amount: cart.total_amount,
                        payment_method: request.payment_method.as_str().to_string(),
                        reference: MovementReference::Order(order_id),
                        registered_by: ctx.employee_id,
                    },
                )
                .await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, order_number = %order_number, total = %cart.total_amount, "Order created");

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::OrderCreated {
                    order_id,
                    order_number: order_number.clone(),
                    total_amount: cart.total_amount,
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send order created event");
            }
            for p in &reserved {
                if p.is_below_min_stock() {
                    let _ = sender
                        .send(Event::LowStockDetected {
                            product_id: p.id,
                            stock_quantity: p.stock_quantity,
                            min_stock: p.min_stock,
                        })
                        .await;
                }
            }
        }

        Ok(OrderDetail {
            order: order_model,
            items,
        })
    }

    /// Confirms a pending order, recording who confirmed it and the
    /// channel-appropriate estimated date.
    #[instrument(skip(self, ctx, request), fields(order_id = %order_id, employee_id = %ctx.employee_id))]
    pub async fn confirm_order(
        &self,
        ctx: &StaffContext,
        order_id: Uuid,
        request: ConfirmOrderRequest,
    ) -> Result<order::Model, ServiceError> {
        auth::require(ctx, Capability::ConfirmOrder)?;

        let db = &*self.db;
        let txn = db.begin().await?;

        let existing = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if existing.status != OrderStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "Order {} cannot be confirmed from status '{}'",
                existing.order_number,
                existing.status.as_str()
            )));
        }

        let now = Utc::now();
        let delivery_type = existing.delivery_type;
        let order_number = existing.order_number.clone();
        let prior_notes = existing.notes.clone();
        let version = existing.version;

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(OrderStatus::Confirmed);
        active.requires_confirmation = Set(false);
        active.confirmed_by = Set(Some(ctx.employee_id));
        active.confirmed_at = Set(Some(now));
        match delivery_type {
            DeliveryType::Pickup => active.estimated_pickup_date = Set(request.estimated_date),
            DeliveryType::Delivery | DeliveryType::Express => {
                active.estimated_delivery_date = Set(request.estimated_date)
            }
        }

        let note_text = match request.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(extra) => format!("Order confirmed. {}", extra),
            None => "Order confirmed".to_string(),
        };
        active.notes = Set(Some(notes_log::append(
            prior_notes.as_deref(),
            &NoteEntry::new(ctx.employee_id.to_string(), note_text),
        )));
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);

        let updated = active.update(&txn).await?;

        txn.commit().await?;

        info!(order_id = %order_id, order_number = %order_number, "Order confirmed");

        self.emit_status_change(order_id, OrderStatus::Pending, OrderStatus::Confirmed)
            .await;

        Ok(updated)
    }

    /// Advances an order along its per-channel state machine.
    ///
    /// Target-state side effects: `shipped` requires and stores a tracking
    /// number; `delivered`/`picked_up` stamp the delivery date, mark the
    /// payment as paid and record revenue once; `ready_pickup` appends a
    /// customer-facing note; `cancelled` restores the reserved stock.
    #[instrument(skip(self, ctx, request), fields(order_id = %order_id, new_status = request.new_status.as_str()))]
    pub async fn update_order_status(
        &self,
        ctx: &StaffContext,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<order::Model, ServiceError> {
        let capability = if request.new_status == OrderStatus::Cancelled {
            Capability::CancelOrder
        } else {
            Capability::AdvanceOrderStatus
        };
        auth::require(ctx, capability)?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start transaction for status update");
            ServiceError::DatabaseError(e)
        })?;

        let existing = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = existing.status;
        let new_status = request.new_status;

        if !order_status::is_valid_transition(old_status, existing.delivery_type, new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "Order {} ({}) cannot transition from '{}' to '{}'",
                existing.order_number,
                existing.delivery_type.as_str(),
                old_status.as_str(),
                new_status.as_str()
            )));
        }

        let now = Utc::now();
        let order_number = existing.order_number.clone();
        let total_amount = existing.total_amount;
        let payment_method = existing.payment_method;
        let prior_notes = existing.notes.clone();
        let version = existing.version;

        let mut released: Vec<(Uuid, i32)> = Vec::new();
        let mut note_lines: Vec<String> = Vec::new();

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(new_status);
        active.processed_by = Set(Some(ctx.employee_id));
        active.processed_at = Set(Some(now));

        match new_status {
            OrderStatus::Shipped => {
                let tracking = request
                    .tracking_number
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        ServiceError::ValidationError(
                            "a tracking number is required to mark an order shipped".to_string(),
                        )
                    })?;
                active.tracking_number = Set(Some(tracking.to_string()));
                note_lines.push(format!("Shipped with tracking number {}", tracking));
            }
            OrderStatus::Delivered | OrderStatus::PickedUp => {
                active.delivery_date = Set(Some(now));
                active.payment_status = Set(PaymentStatus::Paid);

                // Revenue is recorded exactly once per order: skip when a
                // movement (pending transfer or earlier completion) exists.
                let reference = MovementReference::Order(order_id);
                if self
                    .finance
                    .movement_for_reference(&txn, reference)
                    .await?
                    .is_none()
                {
                    self.finance
                        .record_income(
                            &txn,
                            RecordIncome {
                                category: MovementCategory::StoreSaleCompleted,
                                description: format!("Store order {} completed", order_number),
                                amount: total_amount,
                                payment_method: payment_method.as_str().to_string(),
                                reference,
                                registered_by: ctx.employee_id,
                            },
                        )
                        .await?;
                }
            }
            OrderStatus::ReadyPickup => {
                note_lines.push("Order is ready for pickup at the store".to_string());
            }
            OrderStatus::Cancelled => {
                let items = OrderItemEntity::find()
                    .filter(order_item::Column::OrderId.eq(order_id))
                    .all(&txn)
                    .await?;
                for item in &items {
                    self.inventory
                        .release(&txn, item.product_id, item.quantity)
                        .await?;
                    released.push((item.product_id, item.quantity));
                }
                note_lines.push("Order cancelled, stock restored".to_string());
            }
            _ => {}
        }

        if let Some(extra) = request.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            note_lines.push(extra.to_string());
        }

        let mut notes = prior_notes;
        for line in &note_lines {
            notes = Some(notes_log::append(
                notes.as_deref(),
                &NoteEntry::new(ctx.employee_id.to_string(), line),
            ));
        }
        active.notes = Set(notes);
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);

        let updated = active.update(&txn).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit status update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            old_status = old_status.as_str(),
            new_status = new_status.as_str(),
            "Order status updated"
        );

        self.emit_status_change(order_id, old_status, new_status).await;

        if let Some(sender) = &self.event_sender {
            if new_status == OrderStatus::Cancelled {
                let _ = sender.send(Event::OrderCancelled { order_id }).await;
                for (product_id, quantity) in released {
                    let _ = sender
                        .send(Event::StockReleased {
                            product_id,
                            quantity,
                        })
                        .await;
                }
            }
        }

        Ok(updated)
    }

    /// Cancels an order with a reason note. Cancellation is
    /// inventory-neutral: the reserved stock is restored.
    #[instrument(skip(self, ctx), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        ctx: &StaffContext,
        order_id: Uuid,
        reason: Option<String>,
    ) -> Result<order::Model, ServiceError> {
        self.update_order_status(
            ctx,
            order_id,
            UpdateOrderStatusRequest {
                new_status: OrderStatus::Cancelled,
                notes: reason,
                tracking_number: None,
            },
        )
        .await
    }

    /// Retrieves an order with its line items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderDetail>, ServiceError> {
        let db = &*self.db;

        let Some(found) = OrderEntity::find_by_id(order_id).one(db).await? else {
            return Ok(None);
        };

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(Some(OrderDetail {
            order: found,
            items,
        }))
    }

    /// Lists orders, newest first, optionally filtered by status.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }

        let db = &*self.db;

        let mut query = OrderEntity::find();
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(order::Column::PlacedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        Ok((orders, total))
    }

    fn validate_channel_fields(request: &CreateOrderRequest) -> Result<(), ServiceError> {
        match request.delivery_type {
            DeliveryType::Delivery | DeliveryType::Express => {
                if request.shipping_address.is_none() {
                    return Err(ServiceError::ValidationError(format!(
                        "a shipping address is required for {} orders",
                        request.delivery_type.as_str()
                    )));
                }
            }
            DeliveryType::Pickup => {
                if request.pickup_date.is_none() {
                    return Err(ServiceError::ValidationError(
                        "a pickup date is required for pickup orders".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    async fn fetch_active_products(
        &self,
        items: &[OrderItemInput],
    ) -> Result<HashMap<Uuid, product::Model>, ServiceError> {
        let db = &*self.db;

        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        for item in items {
            let Some(found) = products.get(&item.product_id) else {
                return Err(ServiceError::NotFound(format!(
                    "Product {} not found",
                    item.product_id
                )));
            };
            if !found.is_active {
                return Err(ServiceError::Conflict(format!(
                    "Product '{}' is inactive",
                    found.name
                )));
            }
        }

        Ok(products)
    }

    fn price_items(
        items: &[OrderItemInput],
        products: &HashMap<Uuid, product::Model>,
        discount_amount: Decimal,
    ) -> Result<pricing::PricedCart, ServiceError> {
        let lines: Vec<LineInput<'_>> = items
            .iter()
            .map(|item| {
                let found = products.get(&item.product_id).ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;
                Ok(LineInput {
                    product: found,
                    quantity: item.quantity,
                    discount_percent: item.discount_percent.unwrap_or(Decimal::ZERO),
                })
            })
            .collect::<Result<_, ServiceError>>()?;

        pricing::price_cart(&lines, discount_amount)
    }

    async fn insert_items_and_reserve(
        &self,
        txn: &DatabaseTransaction,
        order_id: Uuid,
        cart: &pricing::PricedCart,
    ) -> Result<(Vec<order_item::Model>, Vec<product::Model>), ServiceError> {
        let now = Utc::now();
        let mut items = Vec::with_capacity(cart.lines.len());
        let mut reserved = Vec::with_capacity(cart.lines.len());

        for line in &cart.lines {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                product_name: Set(line.product_name.clone()),
                product_sku: Set(line.product_sku.clone()),
                unit_price: Set(line.unit_price),
                quantity: Set(line.quantity),
                discount_percent: Set(line.discount_percent),
                line_total: Set(line.line_total),
                created_at: Set(now),
            }
            .insert(txn)
            .await?;
            items.push(item);

            let reserved_product = self
                .inventory
                .reserve(txn, line.product_id, line.quantity)
                .await?;
            reserved.push(reserved_product);
        }

        Ok((items, reserved))
    }

    async fn next_order_number(
        &self,
        txn: &DatabaseTransaction,
        now: chrono::DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        let prefix = format!("{}-{}", ORDER_NUMBER_PREFIX, now.format("%Y%m%d"));
        let today = OrderEntity::find()
            .filter(order::Column::OrderNumber.starts_with(&prefix))
            .count(txn)
            .await?;

        Ok(format!("{}-{:04}", prefix, today + 1))
    }

    async fn emit_status_change(
        &self,
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    ) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::OrderStatusChanged {
                    order_id,
                    old_status: old_status.as_str().to_string(),
                    new_status: new_status.as_str().to_string(),
                })
                .await
            {
                warn!(error = %e, order_id = %order_id, "Failed to send order status changed event");
            }
        }
    }
}
