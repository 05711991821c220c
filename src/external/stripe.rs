use crate::config::{FrontendConfig, StripeConfig};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::time::Duration;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, CreateCheckoutSessionPaymentMethodTypes,
    CreateRefund, Currency, Event, PaymentIntentId, Refund, Webhook,
};
use tokio::time::timeout;

/// One purchasable line of a checkout session, price in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLineItem {
    pub name: String,
    pub unit_amount_minor: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub order_id: i64,
    pub user_id: i64,
    pub line_items: Vec<CheckoutLineItem>,
}

/// Boundary to the external payment provider. The trait keeps the order and
/// payment services testable without network access.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout session and returns the redirect URL.
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> AppResult<String>;

    /// Refunds a previously captured payment.
    async fn refund(&self, external_payment_id: &str) -> AppResult<()>;
}

/// Converts a decimal amount to minor currency units (cents).
pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| AppError::InternalError("amount out of range".to_string()))
}

#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    config: StripeConfig,
    success_url: String,
    cancel_url: String,
}

impl StripeGateway {
    pub fn new(config: StripeConfig, frontend: &FrontendConfig) -> Self {
        let client = Client::new(config.secret_key.clone());
        let success_url = format!(
            "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
            frontend.base_url
        );
        let cancel_url = format!("{}/payment-cancel", frontend.base_url);
        Self {
            client,
            config,
            success_url,
            cancel_url,
        }
    }

    /// Verifies the webhook payload against the shared signing secret. This is
    /// the only authentication the webhook endpoint has.
    pub fn verify_event(&self, payload: &str, signature: &str) -> AppResult<Event> {
        Webhook::construct_event(payload, signature, &self.config.webhook_secret).map_err(|e| {
            log::warn!("Webhook signature verification failed: {e}");
            AppError::InvalidSignature
        })
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> AppResult<String> {
        let line_items = request
            .line_items
            .iter()
            .map(|item| CreateCheckoutSessionLineItems {
                price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                    currency: Currency::USD,
                    product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                        name: item.name.clone(),
                        ..Default::default()
                    }),
                    unit_amount: Some(item.unit_amount_minor),
                    ..Default::default()
                }),
                quantity: Some(1),
                ..Default::default()
            })
            .collect();

        // order_id/user_id travel as opaque metadata so the webhook can
        // correlate the completed session back to the order.
        let metadata = HashMap::from([
            ("order_id".to_string(), request.order_id.to_string()),
            ("user_id".to_string(), request.user_id.to_string()),
        ]);

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.success_url = Some(&self.success_url);
        params.cancel_url = Some(&self.cancel_url);
        params.line_items = Some(line_items);
        params.metadata = Some(metadata);

        let session = timeout(
            self.request_timeout(),
            CheckoutSession::create(&self.client, params),
        )
        .await
        .map_err(|_| AppError::GatewayError("checkout session request timed out".to_string()))?
        .map_err(|e| AppError::GatewayError(format!("checkout session creation failed: {e}")))?;

        session
            .url
            .ok_or_else(|| AppError::GatewayError("checkout session has no redirect URL".to_string()))
    }

    async fn refund(&self, external_payment_id: &str) -> AppResult<()> {
        let payment_intent_id = external_payment_id
            .parse::<PaymentIntentId>()
            .map_err(|e| AppError::RefundFailed(format!("invalid payment intent id: {e}")))?;

        let mut params = CreateRefund::new();
        params.payment_intent = Some(payment_intent_id);

        timeout(self.request_timeout(), Refund::create(&self.client, params))
            .await
            .map_err(|_| AppError::RefundFailed("refund request timed out".to_string()))?
            .map_err(|e| AppError::RefundFailed(format!("provider rejected refund: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_unit_conversion() {
        assert_eq!(to_minor_units(Decimal::new(999, 2)).unwrap(), 999);
        assert_eq!(to_minor_units(Decimal::new(1000, 2)).unwrap(), 1000);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn gateway_builds_redirect_urls_from_frontend_base() {
        let gateway = StripeGateway::new(
            StripeConfig {
                secret_key: "sk_test_123".to_string(),
                webhook_secret: "whsec_123".to_string(),
                request_timeout_secs: 30,
            },
            &FrontendConfig {
                base_url: "https://cinema.example".to_string(),
            },
        );
        assert!(gateway.success_url.starts_with("https://cinema.example/payment-success"));
        assert_eq!(gateway.cancel_url, "https://cinema.example/payment-cancel");
    }
}
