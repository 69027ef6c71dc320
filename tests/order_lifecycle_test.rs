mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::TestApp;
use gympos_api::{
    entities::financial_movement::{MovementCategory, MovementReference},
    entities::order::{
        DeliveryType, OrderPaymentMethod, OrderStatus, PaymentStatus, ShippingAddress,
    },
    errors::ServiceError,
    services::orders::{
        ConfirmOrderRequest, CreateOrderRequest, OrderItemInput, UpdateOrderStatusRequest,
    },
};

fn address() -> ShippingAddress {
    ShippingAddress {
        street: "Av. Amazonas N26-146".to_string(),
        city: "Quito".to_string(),
        state: None,
        postal_code: Some("170135".to_string()),
        reference: Some("Blue building next to the park".to_string()),
    }
}

fn delivery_request(product_id: uuid::Uuid, quantity: i32) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: Some(uuid::Uuid::new_v4()),
        delivery_type: DeliveryType::Delivery,
        items: vec![OrderItemInput {
            product_id,
            quantity,
            discount_percent: None,
        }],
        payment_method: OrderPaymentMethod::Cash,
        discount_amount: Decimal::ZERO,
        shipping_address: Some(address()),
        pickup_date: None,
        pickup_time_slot: None,
        transfer_voucher: None,
        bank_reference: None,
        notes: None,
    }
}

fn pickup_request(product_id: uuid::Uuid, quantity: i32) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: None,
        delivery_type: DeliveryType::Pickup,
        items: vec![OrderItemInput {
            product_id,
            quantity,
            discount_percent: None,
        }],
        payment_method: OrderPaymentMethod::Cash,
        discount_amount: Decimal::ZERO,
        shipping_address: None,
        pickup_date: NaiveDate::from_ymd_opt(2025, 3, 10),
        pickup_time_slot: Some("10:00-12:00".to_string()),
        transfer_voucher: None,
        bank_reference: None,
        notes: None,
    }
}

fn advance(new_status: OrderStatus) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        new_status,
        notes: None,
        tracking_number: None,
    }
}

#[tokio::test]
async fn delivery_order_requires_a_shipping_address() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("Yoga Mat", "MAT-01", dec!(20.00), 10, 2, true)
        .await;

    let mut request = delivery_request(product.id, 1);
    request.shipping_address = None;

    let err = app
        .state
        .order_service()
        .create_order(&app.cashier(), request)
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn pickup_order_requires_a_pickup_date() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("Foam Roller", "ROL-01", dec!(15.00), 10, 2, true)
        .await;

    let mut request = pickup_request(product.id, 1);
    request.pickup_date = None;

    let err = app
        .state
        .order_service()
        .create_order(&app.cashier(), request)
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn delivery_order_walks_the_full_state_machine() {
    let app = TestApp::new().await;
    let staff = app.manager();
    let product = app
        .seed_product("Dumbbell 10kg", "DBL-10", dec!(35.00), 10, 2, true)
        .await;

    let orders = app.state.order_service();
    let detail = orders
        .create_order(&staff, delivery_request(product.id, 2))
        .await
        .expect("create order");
    let order_id = detail.order.id;

    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert!(detail.order.requires_confirmation);
    assert_eq!(app.stock_of(product.id).await, 8);

    // Pending cannot jump straight to packed.
    let err = orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Packed))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));

    let confirmed = orders
        .confirm_order(
            &staff,
            order_id,
            ConfirmOrderRequest {
                estimated_date: NaiveDate::from_ymd_opt(2025, 3, 12),
                notes: Some("confirmed by phone".to_string()),
            },
        )
        .await
        .expect("confirm");
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert!(!confirmed.requires_confirmation);
    assert_eq!(
        confirmed.estimated_delivery_date,
        NaiveDate::from_ymd_opt(2025, 3, 12)
    );
    assert!(confirmed.confirmed_by.is_some());
    assert!(confirmed.notes.as_deref().unwrap().contains("confirmed by phone"));

    orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Preparing))
        .await
        .expect("preparing");
    orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Packed))
        .await
        .expect("packed");

    // Shipping needs a tracking number.
    let err = orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Shipped))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let shipped = orders
        .update_order_status(
            &staff,
            order_id,
            UpdateOrderStatusRequest {
                new_status: OrderStatus::Shipped,
                notes: None,
                tracking_number: Some("SERVI-778123".to_string()),
            },
        )
        .await
        .expect("shipped");
    assert_eq!(shipped.tracking_number.as_deref(), Some("SERVI-778123"));

    let delivered = orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Delivered))
        .await
        .expect("delivered");
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.payment_status, PaymentStatus::Paid);
    assert!(delivered.delivery_date.is_some());

    let movements = app.movements_for(MovementReference::Order(order_id)).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].category, MovementCategory::StoreSaleCompleted);
    assert_eq!(movements[0].amount, delivered.total_amount);

    // Delivered only refunds; a second "delivered" is rejected.
    let err = orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Delivered))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));

    let refunded = orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Refunded))
        .await
        .expect("refunded");
    assert_eq!(refunded.status, OrderStatus::Refunded);
}

#[tokio::test]
async fn pickup_order_reaches_picked_up_with_ready_note() {
    let app = TestApp::new().await;
    let staff = app.manager();
    let product = app
        .seed_product("Kettlebell 16kg", "KBL-16", dec!(45.00), 5, 1, true)
        .await;

    let orders = app.state.order_service();
    let detail = orders
        .create_order(&staff, pickup_request(product.id, 1))
        .await
        .expect("create order");
    let order_id = detail.order.id;

    orders
        .confirm_order(
            &staff,
            order_id,
            ConfirmOrderRequest {
                estimated_date: NaiveDate::from_ymd_opt(2025, 3, 10),
                notes: None,
            },
        )
        .await
        .expect("confirm");
    orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Preparing))
        .await
        .expect("preparing");

    // Pickup orders never pass through the shipping branch.
    let err = orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Packed))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));

    let ready = orders
        .update_order_status(&staff, order_id, advance(OrderStatus::ReadyPickup))
        .await
        .expect("ready");
    assert!(ready.notes.as_deref().unwrap().contains("ready for pickup"));

    let picked = orders
        .update_order_status(&staff, order_id, advance(OrderStatus::PickedUp))
        .await
        .expect("picked up");
    assert_eq!(picked.status, OrderStatus::PickedUp);
    assert_eq!(picked.payment_status, PaymentStatus::Paid);

    let movements = app.movements_for(MovementReference::Order(order_id)).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].category, MovementCategory::StoreSaleCompleted);
}

#[tokio::test]
async fn cancellation_restores_reserved_stock() {
    let app = TestApp::new().await;
    let staff = app.manager();
    let product = app
        .seed_product("Jump Rope", "JRP-01", dec!(8.00), 10, 2, true)
        .await;

    let orders = app.state.order_service();
    let detail = orders
        .create_order(&staff, delivery_request(product.id, 3))
        .await
        .expect("create order");
    assert_eq!(app.stock_of(product.id).await, 7);

    let cancelled = orders
        .cancel_order(&staff, detail.order.id, Some("customer changed mind".to_string()))
        .await
        .expect("cancel");

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(app.stock_of(product.id).await, 10);
    let notes = cancelled.notes.as_deref().unwrap();
    assert!(notes.contains("stock restored"));
    assert!(notes.contains("customer changed mind"));

    // Cancelled is terminal.
    let err = orders
        .update_order_status(&staff, detail.order.id, advance(OrderStatus::Confirmed))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));

    // No revenue was ever recorded for the cancelled order.
    assert!(app
        .movements_for(MovementReference::Order(detail.order.id))
        .await
        .is_empty());
}

#[tokio::test]
async fn confirm_is_only_valid_from_pending() {
    let app = TestApp::new().await;
    let staff = app.manager();
    let product = app
        .seed_product("Gym Gloves", "GLV-01", dec!(11.00), 6, 1, true)
        .await;

    let orders = app.state.order_service();
    let detail = orders
        .create_order(&staff, delivery_request(product.id, 1))
        .await
        .expect("create order");

    orders
        .confirm_order(
            &staff,
            detail.order.id,
            ConfirmOrderRequest {
                estimated_date: None,
                notes: None,
            },
        )
        .await
        .expect("first confirm");

    let err = orders
        .confirm_order(
            &staff,
            detail.order.id,
            ConfirmOrderRequest {
                estimated_date: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidStatus(_));
}

#[tokio::test]
async fn cashier_cannot_cancel_but_manager_can() {
    let app = TestApp::new().await;
    let product = app
        .seed_product("Belt L", "BLT-L", dec!(28.00), 4, 1, true)
        .await;

    let orders = app.state.order_service();
    let detail = orders
        .create_order(&app.cashier(), delivery_request(product.id, 1))
        .await
        .expect("create order");

    let err = orders
        .cancel_order(&app.cashier(), detail.order.id, None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    orders
        .cancel_order(&app.manager(), detail.order.id, None)
        .await
        .expect("manager cancels");
}

#[tokio::test]
async fn upfront_transfer_order_records_pending_revenue_once() {
    let app = TestApp::new().await;
    let staff = app.manager();
    let product = app
        .seed_product("Massage Gun", "MSG-01", dec!(120.00), 3, 1, true)
        .await;

    let mut request = pickup_request(product.id, 1);
    request.payment_method = OrderPaymentMethod::Transfer;
    request.transfer_voucher = Some("Transfer receipt #4471, Banco Guayaquil".to_string());

    let orders = app.state.order_service();
    let detail = orders
        .create_order(&staff, request)
        .await
        .expect("create order");
    let order_id = detail.order.id;

    let movements = app.movements_for(MovementReference::Order(order_id)).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].category, MovementCategory::StoreTransferPending);

    orders
        .confirm_order(
            &staff,
            order_id,
            ConfirmOrderRequest {
                estimated_date: None,
                notes: None,
            },
        )
        .await
        .expect("confirm");
    orders
        .update_order_status(&staff, order_id, advance(OrderStatus::Preparing))
        .await
        .expect("preparing");
    orders
        .update_order_status(&staff, order_id, advance(OrderStatus::ReadyPickup))
        .await
        .expect("ready");
    orders
        .update_order_status(&staff, order_id, advance(OrderStatus::PickedUp))
        .await
        .expect("picked up");

    // The pending movement already exists, so completion does not append a
    // second one.
    let movements = app.movements_for(MovementReference::Order(order_id)).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].category, MovementCategory::StoreTransferPending);
}
