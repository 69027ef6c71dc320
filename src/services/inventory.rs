use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
};

/// Inventory ledger: the single writer of `products.stock_quantity`.
///
/// `reserve` and `release` run against the caller's open transaction so the
/// stock mutation commits or rolls back together with the aggregate that
/// caused it.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Atomically checks availability and decrements stock.
    ///
    /// The check happens in the UPDATE itself (`stock_quantity >= quantity
    /// AND is_active`), never against a value read earlier in the request,
    /// so concurrent reservations cannot jointly oversell. Fails closed:
    /// stock never goes negative.
    #[instrument(skip(self, conn), fields(product_id = %product_id, quantity = quantity))]
    pub async fn reserve<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<product::Model, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "reservation quantity must be at least 1".to_string(),
            ));
        }

        let result = ProductEntity::update_many()
            .col_expr(
                product::Column::StockQuantity,
                Expr::col(product::Column::StockQuantity).sub(quantity),
            )
            .col_expr(
                product::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::StockQuantity.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            // Re-read only to report the precise reason.
            let current = ProductEntity::find_by_id(product_id).one(conn).await?;
            return Err(match current {
                None => ServiceError::NotFound(format!("Product {} not found", product_id)),
                Some(p) if !p.is_active => {
                    ServiceError::Conflict(format!("Product '{}' is inactive", p.name))
                }
                Some(p) => ServiceError::InsufficientStock(format!(
                    "Product '{}': requested {}, available {}",
                    p.name, quantity, p.stock_quantity
                )),
            });
        }

        let updated = ProductEntity::find_by_id(product_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if updated.is_below_min_stock() {
            warn!(
                product_id = %updated.id,
                stock_quantity = updated.stock_quantity,
                min_stock = updated.min_stock,
                "Product at or below reorder threshold"
            );
        }

        Ok(updated)
    }

    /// Returns previously reserved stock, e.g. when an order is cancelled.
    #[instrument(skip(self, conn), fields(product_id = %product_id, quantity = quantity))]
    pub async fn release<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError(
                "release quantity must be at least 1".to_string(),
            ));
        }

        let result = ProductEntity::update_many()
            .col_expr(
                product::Column::StockQuantity,
                Expr::col(product::Column::StockQuantity).add(quantity),
            )
            .col_expr(
                product::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(product::Column::Id.eq(product_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        info!(product_id = %product_id, quantity = quantity, "Released stock");

        Ok(())
    }

    /// Advisory availability check for pre-validation. The authoritative
    /// check is the one inside `reserve`.
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<bool, ServiceError> {
        let product = self.get_product(product_id).await?;
        Ok(product
            .map(|p| p.is_active && p.stock_quantity >= quantity)
            .unwrap_or(false))
    }

    pub async fn get_product(
        &self,
        product_id: Uuid,
    ) -> Result<Option<product::Model>, ServiceError> {
        let db = &*self.db;
        Ok(ProductEntity::find_by_id(product_id).one(db).await?)
    }

    /// Active products at or below their reorder threshold, for the
    /// replenishment report.
    #[instrument(skip(self))]
    pub async fn list_below_min_stock(&self) -> Result<Vec<product::Model>, ServiceError> {
        let db = &*self.db;

        let products = ProductEntity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(
                Expr::col(product::Column::StockQuantity)
                    .lte(Expr::col(product::Column::MinStock)),
            )
            .order_by_asc(product::Column::Name)
            .all(db)
            .await?;

        Ok(products)
    }
}
