mod common;

use cinema_backend::entities::{
    OrderStatus, PaymentStatus, movie_entity, order_entity, payment_entity,
};
use cinema_backend::error::AppError;
use cinema_backend::external::{OrderNotifier, PaymentGateway};
use cinema_backend::services::{CartService, OrderService, PaymentService, WebhookOutcome};
use common::{
    FakeGateway, RecordingNotifier, seed_movie, seed_order, seed_payment, seed_user, setup_db,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;

fn service(
    pool: &cinema_backend::database::DbPool,
    gateway: Arc<FakeGateway>,
    notifier: Arc<RecordingNotifier>,
) -> PaymentService {
    PaymentService::new(
        pool.clone(),
        gateway as Arc<dyn PaymentGateway>,
        notifier as Arc<dyn OrderNotifier>,
    )
}

fn service_with_gateway(
    pool: &cinema_backend::database::DbPool,
    gateway: Arc<dyn PaymentGateway>,
) -> PaymentService {
    PaymentService::new(
        pool.clone(),
        gateway,
        Arc::new(RecordingNotifier::default()) as Arc<dyn OrderNotifier>,
    )
}

#[tokio::test]
async fn checkout_charges_the_snapshot_price_not_the_current_one() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;

    let cart = CartService::new(pool.clone());
    let orders = OrderService::new(pool.clone());
    cart.add_item(user.id, movie.id).await.unwrap();
    let order = orders.place_order(user.id).await.unwrap();

    // Price goes up between order placement and checkout.
    movie_entity::ActiveModel {
        id: ActiveValue::Unchanged(movie.id),
        price: Set(Decimal::new(1499, 2)),
        ..Default::default()
    }
    .update(&pool)
    .await
    .unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let payments = service(&pool, gateway.clone(), notifier);

    let response = payments
        .create_checkout_session(user.id, order.id)
        .await
        .unwrap();
    assert_eq!(
        response.payment_url,
        format!("https://pay.example/session/{}", order.id)
    );

    let requests = gateway.checkout_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].order_id, order.id);
    assert_eq!(requests[0].line_items.len(), 1);
    assert_eq!(requests[0].line_items[0].name, "Heat");
    // 9.99, not 14.99.
    assert_eq!(requests[0].line_items[0].unit_amount_minor, 999);
}

#[tokio::test]
async fn checkout_rejects_non_pending_orders_and_strangers() {
    let pool = setup_db().await;
    let alice = seed_user(&pool, "alice@example.com", "user").await;
    let mallory = seed_user(&pool, "mallory@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let paid = seed_order(&pool, alice.id, OrderStatus::Paid, &[&movie]).await;

    let gateway = Arc::new(FakeGateway::default());
    let payments = service(&pool, gateway.clone(), Arc::new(RecordingNotifier::default()));

    assert!(matches!(
        payments.create_checkout_session(alice.id, paid.id).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        payments.create_checkout_session(mallory.id, paid.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(gateway.checkout_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_flags_a_tampered_order_total() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let order = seed_order(&pool, user.id, OrderStatus::Pending, &[&movie]).await;

    order_entity::ActiveModel {
        id: ActiveValue::Unchanged(order.id),
        total_amount: Set(Decimal::new(1, 2)),
        ..Default::default()
    }
    .update(&pool)
    .await
    .unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let payments = service(&pool, gateway.clone(), Arc::new(RecordingNotifier::default()));

    assert!(matches!(
        payments.create_checkout_session(user.id, order.id).await,
        Err(AppError::InvalidOrderTotal)
    ));
    assert!(gateway.checkout_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_confirmation_is_idempotent() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let order = seed_order(&pool, user.id, OrderStatus::Pending, &[&movie]).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let payments = service(&pool, Arc::new(FakeGateway::default()), notifier.clone());

    let outcome = payments
        .confirm_checkout_completed(order.id, 999, Some("pi_123".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Processed);

    let stored = order_entity::Entity::find_by_id(order.id)
        .one(&pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Paid);

    let rows = payment_entity::Entity::find()
        .filter(payment_entity::Column::OrderId.eq(order.id))
        .all(&pool)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, Decimal::new(999, 2));
    assert_eq!(rows[0].status, PaymentStatus::Successful);
    assert_eq!(rows[0].external_payment_id.as_deref(), Some("pi_123"));

    assert_eq!(
        notifier.sent.lock().unwrap().as_slice(),
        &[("alice@example.com".to_string(), order.id)]
    );

    // Redelivery: no new payment row, no second email.
    let outcome = payments
        .confirm_checkout_completed(order.id, 999, Some("pi_123".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);

    let rows = payment_entity::Entity::find()
        .filter(payment_entity::Column::OrderId.eq(order.id))
        .all(&pool)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(notifier.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn webhook_for_unknown_order_is_not_found() {
    let pool = setup_db().await;
    let payments = service(
        &pool,
        Arc::new(FakeGateway::default()),
        Arc::new(RecordingNotifier::default()),
    );

    assert!(matches!(
        payments.confirm_checkout_completed(42, 999, None).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn failed_notification_rolls_the_whole_confirmation_back() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let order = seed_order(&pool, user.id, OrderStatus::Pending, &[&movie]).await;

    let payments = service(
        &pool,
        Arc::new(FakeGateway::default()),
        Arc::new(RecordingNotifier::failing()),
    );

    assert!(matches!(
        payments
            .confirm_checkout_completed(order.id, 999, Some("pi_123".to_string()))
            .await,
        Err(AppError::MailError(_))
    ));

    // The order is still pending with no payment row, so the provider's
    // redelivery can apply the event cleanly.
    let stored = order_entity::Entity::find_by_id(order.id)
        .one(&pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);

    let rows = payment_entity::Entity::find()
        .filter(payment_entity::Column::OrderId.eq(order.id))
        .all(&pool)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn refund_flips_order_and_payment_after_the_provider_accepts() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let order = seed_order(&pool, user.id, OrderStatus::Paid, &[&movie]).await;
    // An older payment without an external id, then the authoritative one.
    seed_payment(&pool, user.id, order.id, Decimal::new(999, 2), None).await;
    let newest = seed_payment(
        &pool,
        user.id,
        order.id,
        Decimal::new(999, 2),
        Some("pi_real"),
    )
    .await;

    let gateway = Arc::new(FakeGateway::default());
    let payments = service(&pool, gateway.clone(), Arc::new(RecordingNotifier::default()));

    payments.request_refund(user.id, order.id).await.unwrap();

    assert_eq!(
        gateway.refunds.lock().unwrap().as_slice(),
        &["pi_real".to_string()]
    );

    let stored = order_entity::Entity::find_by_id(order.id)
        .one(&pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Refunded);

    let payment = payment_entity::Entity::find_by_id(newest.id)
        .one(&pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn refund_gateway_failure_changes_nothing() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let order = seed_order(&pool, user.id, OrderStatus::Paid, &[&movie]).await;
    let payment = seed_payment(
        &pool,
        user.id,
        order.id,
        Decimal::new(999, 2),
        Some("pi_real"),
    )
    .await;

    let gateway = Arc::new(FakeGateway::failing_refunds());
    let payments = service(&pool, gateway, Arc::new(RecordingNotifier::default()));

    assert!(matches!(
        payments.request_refund(user.id, order.id).await,
        Err(AppError::RefundFailed(_))
    ));

    let stored = order_entity::Entity::find_by_id(order.id)
        .one(&pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Paid);

    let stored = payment_entity::Entity::find_by_id(payment.id)
        .one(&pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, PaymentStatus::Successful);
}

#[tokio::test]
async fn refund_requires_a_paid_order_with_an_external_payment() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let pending = seed_order(&pool, user.id, OrderStatus::Pending, &[&movie]).await;
    let orphan = seed_order(&pool, user.id, OrderStatus::Paid, &[&movie]).await;

    let payments = service(
        &pool,
        Arc::new(FakeGateway::default()),
        Arc::new(RecordingNotifier::default()),
    );

    assert!(matches!(
        payments.request_refund(user.id, pending.id).await,
        Err(AppError::InvalidState(_))
    ));
    // Paid but with no payment rows at all.
    assert!(matches!(
        payments.request_refund(user.id, orphan.id).await,
        Err(AppError::NoPaymentFound)
    ));
}

/// Gateway double whose refund call marks the order refunded in the
/// database before returning, simulating a duplicate request that
/// completes while this one is talking to the provider.
struct RacingRefundGateway {
    pool: cinema_backend::database::DbPool,
    order_id: i64,
}

#[async_trait::async_trait]
impl PaymentGateway for RacingRefundGateway {
    async fn create_checkout_session(
        &self,
        _request: cinema_backend::external::CheckoutSessionRequest,
    ) -> cinema_backend::error::AppResult<String> {
        unreachable!("refund-only double")
    }

    async fn refund(&self, _external_payment_id: &str) -> cinema_backend::error::AppResult<()> {
        order_entity::Entity::update_many()
            .set(order_entity::ActiveModel {
                status: Set(OrderStatus::Refunded),
                ..Default::default()
            })
            .filter(order_entity::Column::Id.eq(self.order_id))
            .exec(&self.pool)
            .await
            .unwrap();
        Ok(())
    }
}

#[tokio::test]
async fn refund_losing_the_race_reports_invalid_state() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let order = seed_order(&pool, user.id, OrderStatus::Paid, &[&movie]).await;
    seed_payment(
        &pool,
        user.id,
        order.id,
        Decimal::new(999, 2),
        Some("pi_real"),
    )
    .await;

    let gateway = Arc::new(RacingRefundGateway {
        pool: pool.clone(),
        order_id: order.id,
    });
    let payments = service_with_gateway(&pool, gateway);

    // Same classification as refunding a non-paid order outright.
    assert!(matches!(
        payments.request_refund(user.id, order.id).await,
        Err(AppError::InvalidState(_))
    ));

    let stored = order_entity::Entity::find_by_id(order.id)
        .one(&pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Refunded);
}

#[tokio::test]
async fn payment_history_is_newest_first() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let first = seed_order(&pool, user.id, OrderStatus::Paid, &[&movie]).await;
    let second = seed_order(&pool, user.id, OrderStatus::Paid, &[&movie]).await;
    seed_payment(&pool, user.id, first.id, Decimal::new(999, 2), Some("pi_1")).await;
    seed_payment(&pool, user.id, second.id, Decimal::new(999, 2), Some("pi_2")).await;

    let payments = service(
        &pool,
        Arc::new(FakeGateway::default()),
        Arc::new(RecordingNotifier::default()),
    );

    let history = payments.list_payments(user.id).await.unwrap();
    assert_eq!(history.payments.len(), 2);
    assert_eq!(history.payments[0].order_id, second.id);
    assert_eq!(history.payments[1].order_id, first.id);
}
