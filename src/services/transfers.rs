use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DatabaseTransaction, EntityTrait,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{self, Capability, StaffContext},
    entities::financial_movement::MovementReference,
    entities::order::{self, Entity as OrderEntity, OrderStatus, PaymentStatus},
    entities::sale::{self, Entity as SaleEntity, SaleStatus},
    entities::transfer_confirmation,
    errors::ServiceError,
    events::{Event, EventSender},
    models::notes_log::{self, NoteEntry},
    services::finance::FinanceService,
};

/// Which aggregate owns the transfer being confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferTarget {
    Sale(Uuid),
    Order(Uuid),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmTransferRequest {
    pub notes: Option<String>,
    /// Evidence captured at confirmation time, for aggregates that have no
    /// voucher on file yet (transfer on delivery).
    pub voucher: Option<String>,
    pub bank_reference: Option<String>,
}

/// Manual bank-transfer confirmation, shared by sales and orders.
///
/// Confirming is irreversible and single-shot: the `transfer_confirmed`
/// guard is read and set inside one transaction together with the audit row
/// and the ledger correction, so concurrent attempts resolve to exactly one
/// success.
#[derive(Clone)]
pub struct TransferConfirmationService {
    db: Arc<DatabaseConnection>,
    finance: Arc<FinanceService>,
    event_sender: Option<EventSender>,
}

impl TransferConfirmationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        finance: Arc<FinanceService>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            finance,
            event_sender,
        }
    }

    /// Confirms a transfer payment. Admin only.
    #[instrument(skip(self, ctx, request), fields(employee_id = %ctx.employee_id))]
    pub async fn confirm(
        &self,
        ctx: &StaffContext,
        target: TransferTarget,
        request: ConfirmTransferRequest,
    ) -> Result<transfer_confirmation::Model, ServiceError> {
        auth::require(ctx, Capability::ConfirmTransfer)?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for transfer confirmation");
            ServiceError::DatabaseError(e)
        })?;

        let confirmation = match target {
            TransferTarget::Sale(sale_id) => {
                self.confirm_sale(&txn, ctx, sale_id, &request).await?
            }
            TransferTarget::Order(order_id) => {
                self.confirm_order(&txn, ctx, order_id, &request).await?
            }
        };

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit transfer confirmation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            confirmation_id = %confirmation.id,
            reference_id = %confirmation.reference_id,
            amount = %confirmation.amount,
            "Transfer confirmed"
        );

        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender
                .send(Event::TransferConfirmed {
                    reference_id: confirmation.reference_id,
                    reference_type: confirmation.reference_type,
                    amount: confirmation.amount,
                })
                .await
            {
                warn!(error = %e, "Failed to send transfer confirmed event");
            }
        }

        Ok(confirmation)
    }

    async fn confirm_sale(
        &self,
        txn: &DatabaseTransaction,
        ctx: &StaffContext,
        sale_id: Uuid,
        request: &ConfirmTransferRequest,
    ) -> Result<transfer_confirmation::Model, ServiceError> {
        let existing = SaleEntity::find_by_id(sale_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", sale_id)))?;

        if !existing.is_transfer() {
            return Err(ServiceError::InvalidOperation(format!(
                "Sale {} was not paid by transfer",
                existing.sale_number
            )));
        }
        if existing.transfer_confirmed {
            return Err(ServiceError::Conflict(format!(
                "Transfer for sale {} is already confirmed",
                existing.sale_number
            )));
        }

        let now = Utc::now();
        let sale_number = existing.sale_number.clone();
        let amount = existing.transfer_amount.unwrap_or(existing.total_amount);
        let voucher = self.resolve_voucher(existing.transfer_voucher.as_deref(), request)?;
        let bank_reference = existing
            .bank_reference
            .clone()
            .or_else(|| request.bank_reference.clone());
        let prior_notes = existing.notes.clone();
        let version = existing.version;

        let mut active: sale::ActiveModel = existing.into();
        active.transfer_confirmed = Set(true);
        active.transfer_confirmed_by = Set(Some(ctx.employee_id));
        active.transfer_confirmed_at = Set(Some(now));
        active.status = Set(SaleStatus::Completed);
        active.notes = Set(Some(notes_log::append(
            prior_notes.as_deref(),
            &NoteEntry::new(ctx.employee_id.to_string(), "Bank transfer confirmed"),
        )));
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        active.update(txn).await?;

        self.finance
            .confirm_transfer_movement(
                txn,
                MovementReference::Sale(sale_id),
                format!("Transfer sale {} confirmed", sale_number),
                amount,
                ctx.employee_id,
            )
            .await?;

        self.insert_audit_row(
            txn,
            MovementReference::Sale(sale_id),
            voucher,
            bank_reference,
            amount,
            ctx,
            request.notes.clone(),
            now,
        )
        .await
    }

    async fn confirm_order(
        &self,
        txn: &DatabaseTransaction,
        ctx: &StaffContext,
        order_id: Uuid,
        request: &ConfirmTransferRequest,
    ) -> Result<transfer_confirmation::Model, ServiceError> {
        let existing = OrderEntity::find_by_id(order_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if !existing.payment_method.is_transfer() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} was not paid by transfer",
                existing.order_number
            )));
        }
        if existing.transfer_confirmed {
            return Err(ServiceError::Conflict(format!(
                "Transfer for order {} is already confirmed",
                existing.order_number
            )));
        }

        let now = Utc::now();
        let order_number = existing.order_number.clone();
        let amount = existing.transfer_amount.unwrap_or(existing.total_amount);
        let voucher = self.resolve_voucher(existing.transfer_voucher.as_deref(), request)?;
        let bank_reference = existing
            .bank_reference
            .clone()
            .or_else(|| request.bank_reference.clone());
        let was_pending = existing.status == OrderStatus::Pending;
        let voucher_was_on_file = existing.transfer_voucher.is_some();
        let prior_notes = existing.notes.clone();
        let version = existing.version;

        let mut active: order::ActiveModel = existing.into();
        if !voucher_was_on_file {
            // Evidence arrived at confirmation time; keep the aggregate and
            // the audit row in agreement.
            active.transfer_voucher = Set(Some(voucher.clone()));
        }
        active.transfer_confirmed = Set(true);
        active.transfer_confirmed_by = Set(Some(ctx.employee_id));
        active.transfer_confirmed_at = Set(Some(now));
        active.payment_status = Set(PaymentStatus::Paid);
        if was_pending {
            active.status = Set(OrderStatus::Confirmed);
            active.requires_confirmation = Set(false);
            active.confirmed_by = Set(Some(ctx.employee_id));
            active.confirmed_at = Set(Some(now));
        }
        active.notes = Set(Some(notes_log::append(
            prior_notes.as_deref(),
            &NoteEntry::new(ctx.employee_id.to_string(), "Bank transfer confirmed"),
        )));
        active.updated_at = Set(Some(now));
        active.version = Set(version + 1);
        active.update(txn).await?;

        self.finance
            .confirm_transfer_movement(
                txn,
                MovementReference::Order(order_id),
                format!("Store order {} transfer confirmed", order_number),
                amount,
                ctx.employee_id,
            )
            .await?;

        self.insert_audit_row(
            txn,
            MovementReference::Order(order_id),
            voucher,
            bank_reference,
            amount,
            ctx,
            request.notes.clone(),
            now,
        )
        .await
    }

    fn resolve_voucher(
        &self,
        on_file: Option<&str>,
        request: &ConfirmTransferRequest,
    ) -> Result<String, ServiceError> {
        on_file
            .or(request.voucher.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "no transfer voucher on file; provide the voucher description".to_string(),
                )
            })
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_audit_row(
        &self,
        txn: &DatabaseTransaction,
        reference: MovementReference,
        voucher: String,
        bank_reference: Option<String>,
        amount: Decimal,
        ctx: &StaffContext,
        notes: Option<String>,
        now: chrono::DateTime<Utc>,
    ) -> Result<transfer_confirmation::Model, ServiceError> {
        let model = transfer_confirmation::ActiveModel {
            id: Set(Uuid::new_v4()),
            reference_id: Set(reference.reference_id()),
            reference_type: Set(reference.reference_type()),
            voucher: Set(voucher),
            bank_reference: Set(bank_reference),
            amount: Set(amount),
            confirmed_by: Set(ctx.employee_id),
            confirmed_at: Set(now),
            notes: Set(notes),
            created_at: Set(now),
        };

        Ok(model.insert(txn).await?)
    }
}
