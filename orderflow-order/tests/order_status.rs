mod common;

use common::{basic_catalog, Harness, ADDRESS};
use orderflow_core::OrderRepository;
use orderflow_order::{delivery::REGISTERED, Collaborator, OrderError};
use orderflow_shared::CartItem;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_status_is_passed_through_unchanged() {
    let h = Harness::new(basic_catalog());
    let order = h
        .service
        .create_order(7, &[CartItem::new(1, 1, 10.0)], ADDRESS)
        .await
        .unwrap();
    let delivery_id = order.delivery_id.clone().unwrap();

    assert_eq!(h.service.get_order_status(order.id).await.unwrap(), REGISTERED);

    for status in ["Out For Delivery", "held_at_depot: customs", "DELIVERED"] {
        h.gateway.inner.update_status(&delivery_id, status).await.unwrap();
        assert_eq!(h.service.get_order_status(order.id).await.unwrap(), status);
    }
}

#[tokio::test]
async fn test_unknown_order() {
    let h = Harness::new(basic_catalog());

    let err = h.service.get_order_status(404).await.unwrap_err();

    assert!(matches!(err, OrderError::OrderNotFound(404)));
}

#[tokio::test]
async fn test_order_without_delivery() {
    let h = Harness::new(basic_catalog());
    h.gateway.registration_failures.store(1, Ordering::SeqCst);

    let err = h
        .service
        .create_order(7, &[CartItem::new(1, 1, 10.0)], ADDRESS)
        .await
        .unwrap_err();
    let order_id = err.order_id().unwrap();

    let err = h.service.get_order_status(order_id).await.unwrap_err();
    assert!(matches!(err, OrderError::DeliveryNotRegistered(id) if id == order_id));
}

#[tokio::test]
async fn test_status_lookup_retries_transient_failures() {
    let h = Harness::new(basic_catalog());
    let order = h
        .service
        .create_order(7, &[CartItem::new(1, 1, 10.0)], ADDRESS)
        .await
        .unwrap();

    h.gateway.status_failures.store(2, Ordering::SeqCst);
    h.orders.lookup_failures.store(1, Ordering::SeqCst);

    assert_eq!(h.service.get_order_status(order.id).await.unwrap(), REGISTERED);
}

#[tokio::test]
async fn test_gateway_outage_is_reported() {
    let h = Harness::new(basic_catalog());
    let order = h
        .service
        .create_order(7, &[CartItem::new(1, 1, 10.0)], ADDRESS)
        .await
        .unwrap();

    h.gateway.status_failures.store(10, Ordering::SeqCst);

    let err = h.service.get_order_status(order.id).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::CollaboratorUnavailable {
            collaborator: Collaborator::DeliveryGateway,
            ..
        }
    ));
    assert!(err.is_transient());
    assert_eq!(h.gateway.status_calls(), 3);
}

#[tokio::test]
async fn test_delivery_unknown_to_gateway_is_not_retried() {
    let h = Harness::new(basic_catalog());
    h.gateway.registration_failures.store(1, Ordering::SeqCst);
    let order_id = h
        .service
        .create_order(7, &[CartItem::new(1, 1, 10.0)], ADDRESS)
        .await
        .unwrap_err()
        .order_id()
        .unwrap();
    // Recorded on the order, never issued by the gateway
    h.orders.inner.attach_delivery(order_id, "DLV-999999").await.unwrap();

    let err = h.service.get_order_status(order_id).await.unwrap_err();

    assert!(matches!(
        err,
        OrderError::CollaboratorRejected {
            collaborator: Collaborator::DeliveryGateway,
            ..
        }
    ));
    assert!(!err.is_transient());
    assert!(err.to_string().contains("DLV-999999"));
    assert_eq!(h.gateway.status_calls(), 1);
}
