use crate::database::DbPool;
use crate::entities::{
    OrderStatus, PaymentStatus, movie_entity, order_entity, order_item_entity, payment_entity,
    user_entity,
};
use crate::error::{AppError, AppResult};
use crate::external::mailer::OrderNotifier;
use crate::external::stripe::{
    CheckoutLineItem, CheckoutSessionRequest, PaymentGateway, to_minor_units,
};
use crate::models::{PaymentResponse, PaymentUrlResponse, PaymentsResponse};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of applying a `checkout.session.completed` event.
#[derive(Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    AlreadyProcessed,
}

#[derive(Clone)]
pub struct PaymentService {
    pool: DbPool,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn OrderNotifier>,
}

impl PaymentService {
    pub fn new(
        pool: DbPool,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            pool,
            gateway,
            notifier,
        }
    }

    /// Starts payment for a pending order and returns the provider redirect
    /// URL. No transaction is held across the gateway call.
    pub async fn create_checkout_session(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> AppResult<PaymentUrlResponse> {
        let order = self.owned_order(user_id, order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(AppError::InvalidState(
                "Only pending orders can be paid".to_string(),
            ));
        }

        let items = order_item_entity::Entity::find()
            .filter(order_item_entity::Column::OrderId.eq(order.id))
            .all(&self.pool)
            .await?;

        let items_total: Decimal = items.iter().map(|i| i.price_at_order).sum();
        if items_total != order.total_amount {
            return Err(AppError::InvalidOrderTotal);
        }

        let movie_ids: Vec<i64> = items.iter().map(|i| i.movie_id).collect();
        let movie_names: HashMap<i64, String> = movie_entity::Entity::find()
            .filter(movie_entity::Column::Id.is_in(movie_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect();

        let mut line_items = Vec::with_capacity(items.len());
        for item in &items {
            line_items.push(CheckoutLineItem {
                name: movie_names
                    .get(&item.movie_id)
                    .cloned()
                    .unwrap_or_default(),
                unit_amount_minor: to_minor_units(item.price_at_order)?,
            });
        }

        let payment_url = self
            .gateway
            .create_checkout_session(CheckoutSessionRequest {
                order_id: order.id,
                user_id,
                line_items,
            })
            .await?;

        Ok(PaymentUrlResponse { payment_url })
    }

    /// Applies a verified `checkout.session.completed` event. The pending ->
    /// paid transition, the payment row and the confirmation email commit
    /// together; a redelivered event finds zero rows to update and leaves no
    /// trace.
    pub async fn confirm_checkout_completed(
        &self,
        order_id: i64,
        amount_minor: i64,
        external_payment_id: Option<String>,
    ) -> AppResult<WebhookOutcome> {
        let order = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let txn = self.pool.begin().await?;

        let result = order_entity::Entity::update_many()
            .set(order_entity::ActiveModel {
                status: Set(OrderStatus::Paid),
                ..Default::default()
            })
            .filter(order_entity::Column::Id.eq(order_id))
            .filter(order_entity::Column::Status.eq(OrderStatus::Pending))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        payment_entity::ActiveModel {
            user_id: Set(order.user_id),
            order_id: Set(order_id),
            created_at: Set(Utc::now()),
            status: Set(PaymentStatus::Successful),
            amount: Set(Decimal::new(amount_minor, 2)),
            external_payment_id: Set(external_payment_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let user = user_entity::Entity::find_by_id(order.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // A failed notification rolls everything back; the provider will
        // redeliver the event and the whole block runs again.
        self.notifier
            .send_order_confirmation(&user.email, order_id)
            .await?;

        txn.commit().await?;
        Ok(WebhookOutcome::Processed)
    }

    /// Refunds a paid order. The gateway call happens first; only after the
    /// provider accepts does the order flip to refunded.
    pub async fn request_refund(&self, user_id: i64, order_id: i64) -> AppResult<()> {
        let order = self.owned_order(user_id, order_id).await?;
        if order.status != OrderStatus::Paid {
            return Err(AppError::InvalidState(
                "Only paid orders can be refunded".to_string(),
            ));
        }

        let payment = payment_entity::Entity::find()
            .filter(payment_entity::Column::OrderId.eq(order_id))
            .order_by_desc(payment_entity::Column::CreatedAt)
            .order_by_desc(payment_entity::Column::Id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::NoPaymentFound)?;
        let external_payment_id = payment
            .external_payment_id
            .clone()
            .ok_or(AppError::NoPaymentFound)?;

        self.gateway.refund(&external_payment_id).await?;

        let txn = self.pool.begin().await?;

        let result = order_entity::Entity::update_many()
            .set(order_entity::ActiveModel {
                status: Set(OrderStatus::Refunded),
                ..Default::default()
            })
            .filter(order_entity::Column::Id.eq(order_id))
            .filter(order_entity::Column::Status.eq(OrderStatus::Paid))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(
                "Only paid orders can be refunded".to_string(),
            ));
        }

        payment_entity::Entity::update_many()
            .set(payment_entity::ActiveModel {
                status: Set(PaymentStatus::Refunded),
                ..Default::default()
            })
            .filter(payment_entity::Column::Id.eq(payment.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn list_payments(&self, user_id: i64) -> AppResult<PaymentsResponse> {
        let payments = payment_entity::Entity::find()
            .filter(payment_entity::Column::UserId.eq(user_id))
            .order_by_desc(payment_entity::Column::CreatedAt)
            .order_by_desc(payment_entity::Column::Id)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(PaymentResponse::from)
            .collect();

        Ok(PaymentsResponse { payments })
    }

    async fn owned_order(&self, user_id: i64, order_id: i64) -> AppResult<order_entity::Model> {
        let order = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?;
        match order {
            Some(o) if o.user_id == user_id => Ok(o),
            _ => Err(AppError::NotFound("Order not found".to_string())),
        }
    }
}
