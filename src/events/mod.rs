use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::entities::financial_movement::ReferenceType;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Domain events emitted after a transaction commits. Delivery is
/// best-effort: a full channel never fails the committed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    SaleCreated {
        sale_id: Uuid,
        sale_number: String,
        total_amount: Decimal,
    },
    OrderCreated {
        order_id: Uuid,
        order_number: String,
        total_amount: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderCancelled {
        order_id: Uuid,
    },
    TransferConfirmed {
        reference_id: Uuid,
        reference_type: ReferenceType,
        amount: Decimal,
    },
    StockReleased {
        product_id: Uuid,
        quantity: i32,
    },
    LowStockDetected {
        product_id: Uuid,
        stock_quantity: i32,
        min_stock: i32,
    },
}

/// Drains the event channel, logging each event. The notification channel
/// and reporting consumers subscribe here in the full deployment.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "Processing event");
    }
}
