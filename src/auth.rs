//! Authorization gate for the fulfillment core.
//!
//! Identity arrives from the (external) auth boundary as a [`StaffContext`];
//! this module only decides whether that identity may perform an operation.
//! Every mutating service call runs [`require`] before any other validation.

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Staff role as asserted by the auth boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

/// Operations the core gates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Capability {
    CreateSale,
    CreateOrder,
    ConfirmOrder,
    AdvanceOrderStatus,
    CancelOrder,
    ConfirmTransfer,
}

impl Role {
    pub fn allows(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Admin => true,
            Role::Manager => !matches!(capability, ConfirmTransfer),
            Role::Cashier => matches!(
                capability,
                CreateSale | CreateOrder | ConfirmOrder | AdvanceOrderStatus
            ),
        }
    }
}

/// Acting staff member attached to every mutating call. Trusted for audit
/// fields (`employee_id`, `confirmed_by`, `processed_by`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffContext {
    pub employee_id: Uuid,
    pub role: Role,
}

impl StaffContext {
    pub fn new(employee_id: Uuid, role: Role) -> Self {
        Self { employee_id, role }
    }
}

/// Rejects the call with `Forbidden` when the acting role lacks the
/// capability.
pub fn require(ctx: &StaffContext, capability: Capability) -> Result<(), ServiceError> {
    if ctx.role.allows(capability) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "role '{}' may not {}",
            ctx.role, capability
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn admin_has_every_capability() {
        let ctx = StaffContext::new(Uuid::new_v4(), Role::Admin);
        for cap in [
            Capability::CreateSale,
            Capability::CreateOrder,
            Capability::ConfirmOrder,
            Capability::AdvanceOrderStatus,
            Capability::CancelOrder,
            Capability::ConfirmTransfer,
        ] {
            assert!(require(&ctx, cap).is_ok());
        }
    }

    #[test]
    fn only_admin_confirms_transfers() {
        let manager = StaffContext::new(Uuid::new_v4(), Role::Manager);
        let cashier = StaffContext::new(Uuid::new_v4(), Role::Cashier);

        assert_matches!(
            require(&manager, Capability::ConfirmTransfer),
            Err(ServiceError::Forbidden(_))
        );
        assert_matches!(
            require(&cashier, Capability::ConfirmTransfer),
            Err(ServiceError::Forbidden(_))
        );
    }

    #[test]
    fn cashier_cannot_cancel_orders() {
        let cashier = StaffContext::new(Uuid::new_v4(), Role::Cashier);
        assert_matches!(
            require(&cashier, Capability::CancelOrder),
            Err(ServiceError::Forbidden(_))
        );
        assert!(require(&cashier, Capability::CreateSale).is_ok());
        assert!(require(&cashier, Capability::AdvanceOrderStatus).is_ok());
    }
}
