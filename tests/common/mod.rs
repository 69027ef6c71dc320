// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use tokio::sync::mpsc;
use uuid::Uuid;

use gympos_api::{
    auth::{Role, StaffContext},
    config::AppConfig,
    db::{self, DbConfig},
    entities::financial_movement::{self, Entity as MovementEntity, MovementReference},
    entities::product,
    entities::transfer_confirmation::{self, Entity as ConfirmationEntity},
    events::{process_events, EventSender},
    AppState,
};

/// Test harness over an in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());

        // A single pooled connection keeps the in-memory database alive and
        // shared across the whole test.
        let db_config = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("db connect");
        db::run_migrations(&pool).await.expect("migrations");

        let (tx, rx) = mpsc::channel(256);
        let sender = EventSender::new(tx);
        let event_task = tokio::spawn(process_events(rx));

        let state = AppState::new(Arc::new(pool), cfg, Some(sender));

        Self {
            state,
            _event_task: event_task,
        }
    }

    pub fn admin(&self) -> StaffContext {
        StaffContext::new(Uuid::new_v4(), Role::Admin)
    }

    pub fn manager(&self) -> StaffContext {
        StaffContext::new(Uuid::new_v4(), Role::Manager)
    }

    pub fn cashier(&self) -> StaffContext {
        StaffContext::new(Uuid::new_v4(), Role::Cashier)
    }

    /// Inserts a catalog product with the given price and stock.
    pub async fn seed_product(
        &self,
        name: &str,
        sku: &str,
        price: Decimal,
        stock_quantity: i32,
        min_stock: i32,
        is_active: bool,
    ) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            sku: Set(sku.to_string()),
            price: Set(price),
            stock_quantity: Set(stock_quantity),
            min_stock: Set(min_stock),
            is_active: Set(is_active),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn stock_of(&self, product_id: Uuid) -> i32 {
        product::Entity::find_by_id(product_id)
            .one(&*self.state.db)
            .await
            .expect("fetch product")
            .expect("product exists")
            .stock_quantity
    }

    pub async fn movements_for(
        &self,
        reference: MovementReference,
    ) -> Vec<financial_movement::Model> {
        MovementEntity::find()
            .filter(financial_movement::Column::ReferenceId.eq(reference.reference_id()))
            .filter(financial_movement::Column::ReferenceType.eq(reference.reference_type()))
            .all(&*self.state.db)
            .await
            .expect("fetch movements")
    }

    pub async fn confirmations_for(
        &self,
        reference: MovementReference,
    ) -> Vec<transfer_confirmation::Model> {
        ConfirmationEntity::find()
            .filter(transfer_confirmation::Column::ReferenceId.eq(reference.reference_id()))
            .filter(
                transfer_confirmation::Column::ReferenceType.eq(reference.reference_type()),
            )
            .all(&*self.state.db)
            .await
            .expect("fetch confirmations")
    }
}
