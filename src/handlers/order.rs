use crate::error::AppError;
use crate::handlers::authenticated_user;
use crate::models::AdminOrderQuery;
use crate::services::{OrderService, PaymentService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/orders",
    tag = "order",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Pending order created from the cart"),
        (status = 400, description = "Cart empty or no orderable items")
    )
)]
pub async fn create_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.place_order(user.id).await {
        Ok(order) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The user's orders, newest first"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.list_orders(user.id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders/admin",
    tag = "order",
    params(
        ("user_id" = Option<i64>, Query, description = "Filter by user"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("start_date" = Option<String>, Query, description = "Created at or after (RFC 3339)"),
        ("end_date" = Option<String>, Query, description = "Created at or before (RFC 3339)"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Page size")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All orders, filtered and paginated"),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn admin_get_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<AdminOrderQuery>,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    if !user.is_admin() {
        return Ok(AppError::Forbidden.error_response());
    }

    match order_service.admin_list_orders(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/{order_id}/pay",
    tag = "order",
    params(("order_id" = i64, Path, description = "Order id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Checkout session created, redirect URL returned"),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Payment gateway failure")
    )
)]
pub async fn pay_order(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service
        .create_checkout_session(user.id, path.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/{order_id}/cancel",
    tag = "order",
    params(("order_id" = i64, Path, description = "Order id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order canceled"),
        (status = 400, description = "Order is not pending"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn cancel_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match order_service.cancel_order(user.id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "message": "Order canceled" }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/orders/{order_id}/refund",
    tag = "order",
    params(("order_id" = i64, Path, description = "Order id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order refunded"),
        (status = 400, description = "Order is not paid, or no payment on record"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Provider rejected the refund")
    )
)]
pub async fn refund_order(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service.request_refund(user.id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "message": "Order refunded" }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    // "/admin" must register ahead of the "/{order_id}" routes.
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(create_order))
            .route("", web::get().to(get_orders))
            .route("/admin", web::get().to(admin_get_orders))
            .route("/{order_id}/pay", web::post().to(pay_order))
            .route("/{order_id}/cancel", web::post().to(cancel_order))
            .route("/{order_id}/refund", web::post().to(refund_order)),
    );
}
