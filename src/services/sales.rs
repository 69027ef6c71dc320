use chrono::Utc;
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
    entities::product,
    entities::sale::{self, Entity as SaleEntity, SalePaymentMethod, SaleStatus},
    entities::sale_item::{self, Entity as SaleItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::finance::{FinanceService, RecordIncome},
    services::inventory::InventoryService,
    services::pricing::{self, LineInput},
};

const SALE_NUMBER_PREFIX: &str = "POS";

/// Transfer vouchers must carry meaningful evidence, not a placeholder.
const MIN_VOUCHER_LEN: usize = 10;

/// One cart position as submitted by the register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Per-line discount percent, defaults to none.
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
}

/// Optional walk-in customer snapshot stored on the sale.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCashSaleRequest {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<SaleItemInput>,
    pub cash_received: Decimal,
    #[validate]
    pub customer: Option<CustomerInfo>,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTransferSaleRequest {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<SaleItemInput>,
    #[validate(length(
        min = 10,
        message = "transfer voucher description must be at least 10 characters"
    ))]
    pub transfer_voucher: String,
    pub bank_reference: Option<String>,
    #[validate]
    pub customer: Option<CustomerInfo>,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub notes: Option<String>,
}

/// A sale with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetail {
    pub sale: sale::Model,
    pub items: Vec<sale_item::Model>,
}

/// In-store sale creation and reads.
///
/// Every creation path writes the sale, its line items, the stock
/// decrements and the financial movement in one transaction; a failure at
/// any point leaves no partial state.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DatabaseConnection>,
    inventory: Arc<InventoryService>,
    finance: Arc<FinanceService>,
    event_sender: Option<EventSender>,
}

impl SaleService {
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

    /// Creates a completed cash sale.
    ///
    /// Cash sufficiency is validated against the computed total before any
    /// storage is touched.
    #[instrument(skip(self, ctx, request), fields(employee_id = %ctx.employee_id))]
    pub async fn create_cash_sale(
        &self,
        ctx: &StaffContext,
        request: CreateCashSaleRequest,
    ) -> Result<SaleDetail, ServiceError> {
        auth::require(ctx, Capability::CreateSale)?;
        request.validate()?;

        let products = self.fetch_active_products(&request.items).await?;
        let cart = Self::price_items(&request.items, &products, request.discount_amount)?;

        if request.cash_received < cart.total_amount {
            return Err(ServiceError::ValidationError(format!(
                "cash received {} is less than the sale total {}",
                request.cash_received, cart.total_amount
            )));
        }
        let change_given = request.cash_received - cart.total_amount;

        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for cash sale");
            ServiceError::DatabaseError(e)
        })?;

        let now = Utc::now();
        let sale_id = Uuid::new_v4();
        let sale_number = self.next_sale_number(&txn, now).await?;

        let sale_model = sale::ActiveModel {
            id: Set(sale_id),
            sale_number: Set(sale_number.clone()),
            employee_id: Set(ctx.employee_id),
            sold_at: Set(now),
            subtotal: Set(cart.subtotal),
            discount_amount: Set(cart.discount_amount),
            tax_amount: Set(cart.tax_amount),
            total_amount: Set(cart.total_amount),
            payment_method: Set(SalePaymentMethod::Cash),
            status: Set(SaleStatus::Completed),
            cash_received: Set(Some(request.cash_received)),
            change_given: Set(Some(change_given)),
            transfer_voucher: Set(None),
            bank_reference: Set(None),
            transfer_amount: Set(None),
            transfer_confirmed: Set(false),
            transfer_confirmed_by: Set(None),
            transfer_confirmed_at: Set(None),
            customer_name: Set(request.customer.as_ref().and_then(|c| c.name.clone())),
            customer_phone: Set(request.customer.as_ref().and_then(|c| c.phone.clone())),
            customer_email: Set(request.customer.as_ref().and_then(|c| c.email.clone())),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(1),
        }
        .insert(&txn)
        .await?;

        let (items, reserved) = self.insert_items_and_reserve(&txn, sale_id, &cart).await?;

        self.finance
            .record_income(
                &txn,
                RecordIncome {
                    category: MovementCategory::LocalCashSale,
                    description: format!("Cash sale {}", sale_number),
                    amount: cart.total_amount,
                    payment_method: SalePaymentMethod::Cash.as_str().to_string(),
                    reference: MovementReference::Sale(sale_id),
                    registered_by: ctx.employee_id,
                },
            )
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, sale_id = %sale_id, "Failed to commit cash sale transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(sale_id = %sale_id, sale_number = %sale_number, total = %cart.total_amount, "Cash sale created");

        self.emit_sale_events(&sale_model, &reserved).await;

        Ok(SaleDetail {
            sale: sale_model,
            items,
        })
    }

    /// Creates a transfer sale awaiting manual bank verification.
    ///
    /// Stock is decremented immediately so unconfirmed transfers still
    /// reserve inventory; the movement stays in its pending category until
    /// an admin confirms the transfer.
    #[instrument(skip(self, ctx, request), fields(employee_id = %ctx.employee_id))]
    pub async fn create_transfer_sale(
        &self,
        ctx: &StaffContext,
        request: CreateTransferSaleRequest,
    ) -> Result<SaleDetail, ServiceError> {
        auth::require(ctx, Capability::CreateSale)?;
        request.validate()?;

        if request.transfer_voucher.trim().len() < MIN_VOUCHER_LEN {
            return Err(ServiceError::ValidationError(format!(
                "transfer voucher description must be at least {} characters",
                MIN_VOUCHER_LEN
            )));
        }

        let products = self.fetch_active_products(&request.items).await?;
        let cart = Self::price_items(&request.items, &products, request.discount_amount)?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for transfer sale");
            ServiceError::DatabaseError(e)
        })?;

        let now = Utc::now();
        let sale_id = Uuid::new_v4();
        let sale_number = self.next_sale_number(&txn, now).await?;

        let sale_model = sale::ActiveModel {
            id: Set(sale_id),
            sale_number: Set(sale_number.clone()),
            employee_id: Set(ctx.employee_id),
            sold_at: Set(now),
            subtotal: Set(cart.subtotal),
            discount_amount: Set(cart.discount_amount),
            tax_amount: Set(cart.tax_amount),
            total_amount: Set(cart.total_amount),
            payment_method: Set(SalePaymentMethod::Transfer),
            status: Set(SaleStatus::TransferPending),
            cash_received: Set(None),
            change_given: Set(None),
            transfer_voucher: Set(Some(request.transfer_voucher.trim().to_string())),
            bank_reference: Set(request.bank_reference.clone()),
            transfer_amount: Set(Some(cart.total_amount)),
            transfer_confirmed: Set(false),
            transfer_confirmed_by: Set(None),
            transfer_confirmed_at: Set(None),
            customer_name: Set(request.customer.as_ref().and_then(|c| c.name.clone())),
            customer_phone: Set(request.customer.as_ref().and_then(|c| c.phone.clone())),
            customer_email: Set(request.customer.as_ref().and_then(|c| c.email.clone())),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(1),
        }
        .insert(&txn)
        .await?;

        let (items, reserved) = self.insert_items_and_reserve(&txn, sale_id, &cart).await?;

        self.finance
            .record_income(
                &txn,
                RecordIncome {
                    category: MovementCategory::LocalTransferPending,
                    description: format!("Transfer sale {} awaiting bank verification", sale_number),
                    amount: cart.total_amount,
                    payment_method: SalePaymentMethod::Transfer.as_str().to_string(),
                    reference: MovementReference::Sale(sale_id),
                    registered_by: ctx.employee_id,
                },
            )
            .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, sale_id = %sale_id, "Failed to commit transfer sale transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(sale_id = %sale_id, sale_number = %sale_number, total = %cart.total_amount, "Transfer sale created, pending confirmation");

        self.emit_sale_events(&sale_model, &reserved).await;

        Ok(SaleDetail {
            sale: sale_model,
            items,
        })
    }

    /// Retrieves a sale with its line items.
    #[instrument(skip(self), fields(sale_id = %sale_id))]
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<Option<SaleDetail>, ServiceError> {
        let db = &*self.db;

        let Some(sale) = SaleEntity::find_by_id(sale_id).one(db).await? else {
            return Ok(None);
        };

        let items = SaleItemEntity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .order_by_asc(sale_item::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(Some(SaleDetail { sale, items }))
    }

    /// Lists sales, newest first.
    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<sale::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }

        let db = &*self.db;

        let paginator = SaleEntity::find()
            .order_by_desc(sale::Column::SoldAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let sales = paginator.fetch_page(page - 1).await?;

        Ok((sales, total))
    }

    /// Loads every referenced product, rejecting unknown or inactive ones
    /// with the offending product identified.
    async fn fetch_active_products(
        &self,
        items: &[SaleItemInput],
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
        items: &[SaleItemInput],
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

    /// Inserts line items and reserves their stock inside the transaction.
    /// Reservation re-checks availability against current rows, so a
    /// concurrent sale that drained the stock fails here and rolls back.
    async fn insert_items_and_reserve(
        &self,
        txn: &DatabaseTransaction,
        sale_id: Uuid,
        cart: &pricing::PricedCart,
    ) -> Result<(Vec<sale_item::Model>, Vec<product::Model>), ServiceError> {
        let now = Utc::now();
        let mut items = Vec::with_capacity(cart.lines.len());
        let mut reserved = Vec::with_capacity(cart.lines.len());

        for line in &cart.lines {
            let item = sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
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

            let product = self
                .inventory
                .reserve(txn, line.product_id, line.quantity)
                .await?;
            reserved.push(product);
        }

        Ok((items, reserved))
    }

    /// Daily sequence: POS-YYYYMMDD-NNNN. Uniqueness is backed by the
    /// unique index; a collision under concurrency fails the transaction
    /// and the caller retries the whole operation.
    async fn next_sale_number(
        &self,
        txn: &DatabaseTransaction,
        now: chrono::DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        let prefix = format!("{}-{}", SALE_NUMBER_PREFIX, now.format("%Y%m%d"));
        let today = SaleEntity::find()
            .filter(sale::Column::SaleNumber.starts_with(&prefix))
            .count(txn)
            .await?;

        Ok(format!("{}-{:04}", prefix, today + 1))
    }

    async fn emit_sale_events(&self, sale_model: &sale::Model, reserved: &[product::Model]) {
        let Some(sender) = &self.event_sender else {
            return;
        };

        if let Err(e) = sender
            .send(Event::SaleCreated {
                sale_id: sale_model.id,
                sale_number: sale_model.sale_number.clone(),
                total_amount: sale_model.total_amount,
            })
            .await
        {
            warn!(error = %e, sale_id = %sale_model.id, "Failed to send sale created event");
        }

        for p in reserved {
            if p.is_below_min_stock() {
                if let Err(e) = sender
                    .send(Event::LowStockDetected {
                        product_id: p.id,
                        stock_quantity: p.stock_quantity,
                        min_stock: p.min_stock,
                    })
                    .await
                {
                    warn!(error = %e, product_id = %p.id, "Failed to send low stock event");
                }
            }
        }
    }
}
