use crate::error::AppError;
use crate::external::stripe::StripeGateway;
use crate::services::{PaymentService, WebhookOutcome};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use stripe::{EventObject, EventType};

/// Stripe webhook endpoint. Authentication is the signature header alone;
/// the auth middleware lets `/webhooks/` through untouched.
pub async fn payment_webhook(
    gateway: web::Data<StripeGateway>,
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    payload: String,
) -> Result<HttpResponse> {
    let signature = match req
        .headers()
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
    {
        Some(s) => s,
        None => return Ok(AppError::InvalidSignature.error_response()),
    };

    let event = match gateway.verify_event(&payload, signature) {
        Ok(event) => event,
        Err(e) => return Ok(e.error_response()),
    };

    if event.type_ != EventType::CheckoutSessionCompleted {
        log::debug!("Ignoring webhook event type {}", event.type_);
        return Ok(HttpResponse::Accepted().json(json!({ "status": "ignored" })));
    }

    let session = match event.data.object {
        EventObject::CheckoutSession(session) => session,
        other => {
            log::warn!("checkout.session.completed carried unexpected object: {other:?}");
            return Ok(HttpResponse::Accepted().json(json!({ "status": "ignored" })));
        }
    };

    let (order_id, amount_minor) =
        match completed_session_fields(session.metadata.as_ref(), session.amount_total) {
            Ok(fields) => fields,
            Err(e) => return Ok(e.error_response()),
        };
    let external_payment_id = session.payment_intent.as_ref().map(|pi| pi.id().to_string());

    match payment_service
        .confirm_checkout_completed(order_id, amount_minor, external_payment_id)
        .await
    {
        Ok(WebhookOutcome::Processed) => {
            log::info!("Order {order_id} marked paid via webhook");
            Ok(HttpResponse::Ok().json(json!({ "status": "processed" })))
        }
        Ok(WebhookOutcome::AlreadyProcessed) => {
            log::info!("Webhook redelivery for order {order_id}, nothing to do");
            Ok(HttpResponse::Ok().json(json!({ "status": "already_processed" })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

/// Order id and amount of a completed session. Both must be present: a
/// session without an amount cannot be recorded as a payment.
fn completed_session_fields(
    metadata: Option<&stripe::Metadata>,
    amount_total: Option<i64>,
) -> Result<(i64, i64), AppError> {
    let order_id: i64 = metadata
        .and_then(|m| m.get("order_id"))
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AppError::BadMetadata("missing or malformed order_id".to_string()))?;

    let amount_minor = amount_total
        .ok_or_else(|| AppError::BadMetadata("missing amount_total".to_string()))?;

    Ok((order_id, amount_minor))
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhooks").route("/payment", web::post().to(payment_webhook)));
}
