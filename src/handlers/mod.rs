pub mod auth;
pub mod cart;
pub mod favorite;
pub mod movie;
pub mod order;
pub mod payment;
pub mod webhook;

pub use auth::auth_config;
pub use cart::cart_config;
pub use favorite::favorite_config;
pub use movie::movie_config;
pub use order::order_config;
pub use payment::payment_config;
pub use webhook::webhook_config;

use crate::error::AppError;
use crate::middlewares::auth::AuthenticatedUser;
use actix_web::{HttpMessage, HttpRequest};

/// Identity placed into request extensions by the auth middleware.
pub(crate) fn authenticated_user(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    req.extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| AppError::AuthError("Missing authentication".to_string()))
}
