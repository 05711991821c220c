use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{OrderStatus, PaymentStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::movie::get_movies,
        handlers::movie::get_movie,
        handlers::cart::add_to_cart,
        handlers::cart::get_cart,
        handlers::cart::clear_cart,
        handlers::cart::remove_from_cart,
        handlers::favorite::add_favorite,
        handlers::favorite::remove_favorite,
        handlers::favorite::get_favorites,
        handlers::order::create_order,
        handlers::order::get_orders,
        handlers::order::admin_get_orders,
        handlers::order::pay_order,
        handlers::order::cancel_order,
        handlers::order::refund_order,
        handlers::payment::get_payments,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            UserResponse,
            AuthResponse,
            GenreResponse,
            MovieResponse,
            CartItemResponse,
            MovieInCartResponse,
            CartMoviesResponse,
            FavoriteResponse,
            FavoriteMovieResponse,
            FavoriteMoviesResponse,
            OrderStatus,
            OrderMovieResponse,
            OrderItemResponse,
            OrderResponse,
            OrdersResponse,
            AdminOrderResponse,
            PaymentUrlResponse,
            PaymentStatus,
            PaymentResponse,
            PaymentsResponse,
            MessageResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "catalog", description = "Movie catalog API"),
        (name = "cart", description = "Shopping cart API"),
        (name = "favorites", description = "Favorite movies API"),
        (name = "order", description = "Order management API"),
        (name = "payment", description = "Payment history API"),
    ),
    info(
        title = "Cinema Backend API",
        version = "1.0.0",
        description = "Online cinema e-commerce REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
