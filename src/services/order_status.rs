//! Order status transition table.
//!
//! The allowed next statuses depend on the current status *and* the
//! fulfillment channel: pickup orders branch through
//! `ready_pickup -> picked_up`, delivery and express orders through
//! `packed -> shipped -> delivered`. `cancelled` is reachable from every
//! state that has not yet handed goods to the customer; a fulfilled order
//! can only move to `refunded`.

use crate::entities::order::{DeliveryType, OrderStatus};

/// Statuses an order may move to from `current` on the given channel.
pub fn allowed_transitions(
    current: OrderStatus,
    delivery_type: DeliveryType,
) -> &'static [OrderStatus] {
    use OrderStatus::*;

    match (current, delivery_type.is_shipped_channel()) {
        (Pending, _) => &[Confirmed, Cancelled],
        (Confirmed, _) => &[Preparing, Cancelled],

        (Preparing, false) => &[ReadyPickup, Cancelled],
        (Preparing, true) => &[Packed, Cancelled],

        (ReadyPickup, false) => &[PickedUp, Cancelled],
        (ReadyPickup, true) => &[],

        (Packed, true) => &[Shipped, Cancelled],
        (Packed, false) => &[],

        (Shipped, true) => &[Delivered, Cancelled],
        (Shipped, false) => &[],

        (Delivered, _) | (PickedUp, _) => &[Refunded],

        (Cancelled, _) | (Refunded, _) => &[],
    }
}

pub fn is_valid_transition(
    current: OrderStatus,
    delivery_type: DeliveryType,
    next: OrderStatus,
) -> bool {
    allowed_transitions(current, delivery_type).contains(&next)
}

/// Statuses with no outgoing transitions on any channel.
pub fn is_terminal(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Cancelled | OrderStatus::Refunded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL_STATUSES: [OrderStatus; 10] = [
        Pending, Confirmed, Preparing, ReadyPickup, Packed, PickedUp, Shipped, Delivered,
        Cancelled, Refunded,
    ];

    #[test]
    fn pickup_happy_path() {
        let dt = DeliveryType::Pickup;
        assert!(is_valid_transition(Pending, dt, Confirmed));
        assert!(is_valid_transition(Confirmed, dt, Preparing));
        assert!(is_valid_transition(Preparing, dt, ReadyPickup));
        assert!(is_valid_transition(ReadyPickup, dt, PickedUp));
        assert!(is_valid_transition(PickedUp, dt, Refunded));
    }

    #[test]
    fn delivery_happy_path() {
        for dt in [DeliveryType::Delivery, DeliveryType::Express] {
            assert!(is_valid_transition(Pending, dt, Confirmed));
            assert!(is_valid_transition(Confirmed, dt, Preparing));
            assert!(is_valid_transition(Preparing, dt, Packed));
            assert!(is_valid_transition(Packed, dt, Shipped));
            assert!(is_valid_transition(Shipped, dt, Delivered));
            assert!(is_valid_transition(Delivered, dt, Refunded));
        }
    }

    #[test]
    fn channels_do_not_cross_branches() {
        assert!(!is_valid_transition(
            Preparing,
            DeliveryType::Pickup,
            Packed
        ));
        assert!(!is_valid_transition(
            Preparing,
            DeliveryType::Delivery,
            ReadyPickup
        ));
        assert!(!is_valid_transition(
            Packed,
            DeliveryType::Pickup,
            Shipped
        ));
    }

    #[test]
    fn no_skipping_stages() {
        assert!(!is_valid_transition(Pending, DeliveryType::Delivery, Packed));
        assert!(!is_valid_transition(
            Confirmed,
            DeliveryType::Pickup,
            PickedUp
        ));
        assert!(!is_valid_transition(
            Pending,
            DeliveryType::Express,
            Delivered
        ));
    }

    #[test]
    fn terminal_states_have_no_outgoing_transitions() {
        for status in [Cancelled, Refunded] {
            assert!(is_terminal(status));
            for dt in [
                DeliveryType::Pickup,
                DeliveryType::Delivery,
                DeliveryType::Express,
            ] {
                assert!(allowed_transitions(status, dt).is_empty());
            }
        }
    }

    #[test]
    fn same_status_is_never_allowed() {
        for status in ALL_STATUSES {
            for dt in [
                DeliveryType::Pickup,
                DeliveryType::Delivery,
                DeliveryType::Express,
            ] {
                assert!(!is_valid_transition(status, dt, status));
            }
        }
    }

    #[test]
    fn cancellation_is_blocked_once_goods_left() {
        for dt in [DeliveryType::Pickup, DeliveryType::Delivery] {
            assert!(!is_valid_transition(Delivered, dt, Cancelled));
            assert!(!is_valid_transition(PickedUp, dt, Cancelled));
        }
    }
}
