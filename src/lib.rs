//! GymPOS API core
//!
//! Transactional heart of the gym/retail back office: in-store sales (cash
//! and bank transfer), online orders (pickup, delivery, express), the
//! inventory ledger both draw stock from, the financial movement log both
//! report into, and the manual transfer-confirmation workflow.
//!
//! The HTTP boundary, media uploads, catalog CRUD and reporting live in
//! sibling crates; they call the services exposed here and render the
//! `ServiceError` mapping from `errors`.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod models;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::finance::FinanceService;
use services::inventory::InventoryService;
use services::orders::OrderService;
use services::sales::SaleService;
use services::transfers::TransferConfirmationService;

/// Application service bundle wired over one database connection.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub finance: Arc<FinanceService>,
    pub sales: Arc<SaleService>,
    pub orders: Arc<OrderService>,
    pub transfers: Arc<TransferConfirmationService>,
}

/// App state definition handed to the request boundary.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Option<events::EventSender>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Option<events::EventSender>,
    ) -> Self {
        let inventory = Arc::new(InventoryService::new(db.clone()));
        let finance = Arc::new(FinanceService::new(db.clone()));
        let sales = Arc::new(SaleService::new(
            db.clone(),
            inventory.clone(),
            finance.clone(),
            event_sender.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            db.clone(),
            inventory.clone(),
            finance.clone(),
            event_sender.clone(),
        ));
        let transfers = Arc::new(TransferConfirmationService::new(
            db.clone(),
            finance.clone(),
            event_sender.clone(),
        ));

        Self {
            db,
            config,
            event_sender,
            services: AppServices {
                inventory,
                finance,
                sales,
                orders,
                transfers,
            },
        }
    }

    pub fn sale_service(&self) -> Arc<SaleService> {
        self.services.sales.clone()
    }

    pub fn order_service(&self) -> Arc<OrderService> {
        self.services.orders.clone()
    }

    pub fn inventory_service(&self) -> Arc<InventoryService> {
        self.services.inventory.clone()
    }

    pub fn finance_service(&self) -> Arc<FinanceService> {
        self.services.finance.clone()
    }

    pub fn transfer_service(&self) -> Arc<TransferConfirmationService> {
        self.services.transfers.clone()
    }
}
