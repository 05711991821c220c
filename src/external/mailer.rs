use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Notification boundary. Failure must surface to the caller; the webhook
/// handler decides whether to fail the whole delivery.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn send_order_confirmation(&self, email: &str, order_id: i64) -> AppResult<()>;
}

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
}

#[derive(Clone)]
pub struct MailerService {
    client: Client,
    config: EmailConfig,
}

impl MailerService {
    pub fn new(config: EmailConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }
}

#[async_trait]
impl OrderNotifier for MailerService {
    async fn send_order_confirmation(&self, email: &str, order_id: i64) -> AppResult<()> {
        if self.config.api_url.is_empty() {
            return Err(AppError::MailError(
                "mail API is not configured".to_string(),
            ));
        }

        let body = SendMailRequest {
            from: &self.config.from_address,
            to: email,
            subject: format!("Your order #{order_id} is confirmed"),
            text: format!(
                "Thank you for your purchase. Order #{order_id} has been paid and the \
                 movies are now available in your library."
            ),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::MailError(format!("mail request failed: {e}")))?;

        if response.status().is_success() {
            log::info!("Order confirmation email sent for order {order_id}");
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            log::error!("Order confirmation email failed for order {order_id}: {error_text}");
            Err(AppError::MailError(format!(
                "mail API rejected the message: {error_text}"
            )))
        }
    }
}
