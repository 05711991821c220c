use crate::handlers::authenticated_user;
use crate::services::CartService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/cart/{movie_id}",
    tag = "cart",
    params(("movie_id" = i64, Path, description = "Movie id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Movie added to the cart"),
        (status = 400, description = "Movie already purchased"),
        (status = 404, description = "Movie not found or unavailable"),
        (status = 409, description = "Movie already in the cart")
    )
)]
pub async fn add_to_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.add_item(user.id, path.into_inner()).await {
        Ok(item) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": item
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Movies currently in the cart"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_cart(cart_service: web::Data<CartService>, req: HttpRequest) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.list_items(user.id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Cart cleared"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn clear_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.clear(user.id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/cart/remove/{movie_id}",
    tag = "cart",
    params(("movie_id" = i64, Path, description = "Movie id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Movie removed if present"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn remove_from_cart(
    cart_service: web::Data<CartService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match cart_service.remove_item(user.id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn cart_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .route("", web::get().to(get_cart))
            .route("", web::delete().to(clear_cart))
            .route("/remove/{movie_id}", web::delete().to(remove_from_cart))
            .route("/{movie_id}", web::post().to(add_to_cart)),
    );
}
