use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use gympos_api::{
    entities::order::{DeliveryType, OrderStatus},
    entities::product,
    services::order_status::{allowed_transitions, is_valid_transition},
    services::pricing::{price_cart, LineInput, TAX_RATE},
};

fn product_with_price(cents: i64) -> product::Model {
    product::Model {
        id: Uuid::new_v4(),
        name: "prop product".to_string(),
        sku: format!("SKU-{}", cents),
        price: Decimal::new(cents, 2),
        stock_quantity: 1_000_000,
        min_stock: 0,
        is_active: true,
        created_at: Utc::now(),
        updated_at: None,
    }
}

proptest! {
    // subtotal + tax - discount == total for every cart the pricer accepts.
    #[test]
    fn totals_are_always_consistent(
        lines in prop::collection::vec((1i64..=100_000, 1i32..=50, 0i64..=100), 1..5),
        discount_pct in 0u32..=100,
    ) {
        let products: Vec<product::Model> = lines
            .iter()
            .map(|(cents, _, _)| product_with_price(*cents))
            .collect();

        let inputs: Vec<LineInput<'_>> = products
            .iter()
            .zip(&lines)
            .map(|(p, (_, qty, line_disc))| LineInput {
                product: p,
                quantity: *qty,
                discount_percent: Decimal::from(*line_disc),
            })
            .collect();

        // First pass establishes the undiscounted total, from which any
        // cart-level discount up to 100% is valid.
        let base = price_cart(&inputs, Decimal::ZERO).unwrap();
        let discount = (base.total_amount * Decimal::from(discount_pct) / dec!(100)).round_dp(2);

        let cart = price_cart(&inputs, discount).unwrap();

        prop_assert_eq!(
            cart.subtotal + cart.tax_amount - cart.discount_amount,
            cart.total_amount
        );
        prop_assert_eq!(cart.tax_amount, (cart.subtotal * TAX_RATE).round_dp(2));
        prop_assert!(cart.total_amount >= Decimal::ZERO);
        prop_assert_eq!(cart.lines.len(), lines.len());
        for line in &cart.lines {
            prop_assert!(line.line_total >= Decimal::ZERO);
        }
    }

    // A valid transition never lands on the state it started from, and
    // terminal states accept nothing.
    #[test]
    fn transitions_never_self_loop(
        current in prop::sample::select(ALL_STATUSES.to_vec()),
        dt in prop::sample::select(ALL_CHANNELS.to_vec()),
    ) {
        prop_assert!(!is_valid_transition(current, dt, current));
        if matches!(current, OrderStatus::Cancelled | OrderStatus::Refunded) {
            prop_assert!(allowed_transitions(current, dt).is_empty());
        }
    }

    // Channel branches stay disjoint: pickup orders never enter the
    // shipping branch and shipped-channel orders never enter the pickup
    // branch.
    #[test]
    fn channel_branches_are_disjoint(
        current in prop::sample::select(ALL_STATUSES.to_vec()),
    ) {
        for next in allowed_transitions(current, DeliveryType::Pickup) {
            prop_assert!(!matches!(
                next,
                OrderStatus::Packed | OrderStatus::Shipped | OrderStatus::Delivered
            ));
        }
        for dt in [DeliveryType::Delivery, DeliveryType::Express] {
            for next in allowed_transitions(current, dt) {
                prop_assert!(!matches!(
                    next,
                    OrderStatus::ReadyPickup | OrderStatus::PickedUp
                ));
            }
        }
    }
}

const ALL_STATUSES: [OrderStatus; 10] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::ReadyPickup,
    OrderStatus::Packed,
    OrderStatus::PickedUp,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
    OrderStatus::Refunded,
];

const ALL_CHANNELS: [DeliveryType; 3] = [
    DeliveryType::Pickup,
    DeliveryType::Delivery,
    DeliveryType::Express,
];
