use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::financial_movement::{
        self, Entity as MovementEntity, MovementCategory, MovementReference, MovementType,
    },
    errors::ServiceError,
};

/// Input for appending an income entry to the movement log.
#[derive(Debug, Clone)]
pub struct RecordIncome {
    pub category: MovementCategory,
    pub description: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub reference: MovementReference,
    pub registered_by: Uuid,
}

/// Financial movement log.
///
/// Append-only with a single sanctioned exception: confirming a pending
/// transfer rewrites that entry's category and description in place so
/// revenue is never double-counted. Amounts are never updated.
#[derive(Clone)]
pub struct FinanceService {
    db: Arc<DatabaseConnection>,
}

impl FinanceService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Appends an income entry inside the caller's transaction.
    #[instrument(skip(self, conn, input), fields(category = input.category.as_str(), amount = %input.amount))]
    pub async fn record_income<C: ConnectionTrait>(
        &self,
        conn: &C,
        input: RecordIncome,
    ) -> Result<financial_movement::Model, ServiceError> {
        let now = Utc::now();

        let model = financial_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            movement_type: Set(MovementType::Income),
            category: Set(input.category),
            description: Set(input.description),
            amount: Set(input.amount),
            payment_method: Set(input.payment_method),
            reference_id: Set(input.reference.reference_id()),
            reference_type: Set(input.reference.reference_type()),
            registered_by: Set(input.registered_by),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let movement = model.insert(conn).await?;

        info!(
            movement_id = %movement.id,
            reference_id = %movement.reference_id,
            "Recorded income movement"
        );

        Ok(movement)
    }

    /// The movement tied to an aggregate, if any. Every aggregate has at
    /// most one movement row.
    pub async fn movement_for_reference<C: ConnectionTrait>(
        &self,
        conn: &C,
        reference: MovementReference,
    ) -> Result<Option<financial_movement::Model>, ServiceError> {
        let movement = MovementEntity::find()
            .filter(financial_movement::Column::ReferenceId.eq(reference.reference_id()))
            .filter(financial_movement::Column::ReferenceType.eq(reference.reference_type()))
            .one(conn)
            .await?;

        Ok(movement)
    }

    /// Settles the movement side of a transfer confirmation.
    ///
    /// A pending-transfer entry is flipped to its confirmed category with a
    /// fresh description; the amount column is untouched. When no movement
    /// exists yet (transfer-on-delivery confirmed before delivery) one is
    /// inserted directly in the confirmed category, and the delivered-path
    /// existence guard keeps it from being recorded twice. An entry already
    /// past pending is returned unchanged.
    #[instrument(skip(self, conn, description), fields(reference_id = %reference.reference_id()))]
    pub async fn confirm_transfer_movement<C: ConnectionTrait>(
        &self,
        conn: &C,
        reference: MovementReference,
        description: String,
        amount: Decimal,
        registered_by: Uuid,
    ) -> Result<financial_movement::Model, ServiceError> {
        let existing = self.movement_for_reference(conn, reference).await?;

        match existing {
            Some(movement) if movement.category.is_transfer_pending() => {
                let confirmed = movement.category.confirmed_variant().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "no confirmed variant for category {}",
                        movement.category.as_str()
                    ))
                })?;

                let mut active: financial_movement::ActiveModel = movement.into();
                active.category = Set(confirmed);
                active.description = Set(description);
                active.updated_at = Set(Some(Utc::now()));

                let updated = active.update(conn).await?;
                info!(movement_id = %updated.id, "Movement flipped to confirmed category");
                Ok(updated)
            }
            Some(movement) => Ok(movement),
            None => {
                let category = match reference {
                    MovementReference::Sale(_) => MovementCategory::LocalTransferConfirmed,
                    MovementReference::Order(_) => MovementCategory::StoreTransferConfirmed,
                };
                self.record_income(
                    conn,
                    RecordIncome {
                        category,
                        description,
                        amount,
                        payment_method: "transfer".to_string(),
                        reference,
                        registered_by,
                    },
                )
                .await
            }
        }
    }

    /// Lists movements, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<financial_movement::Model>, u64), ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }

        let db = &*self.db;

        let paginator = MovementEntity::find()
            .order_by_desc(financial_movement::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let movements = paginator.fetch_page(page - 1).await?;

        Ok((movements, total))
    }
}
