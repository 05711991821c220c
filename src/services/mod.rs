pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod favorite_service;
pub mod order_service;
pub mod payment_service;

pub use auth_service::*;
pub use cart_service::*;
pub use catalog_service::*;
pub use favorite_service::*;
pub use order_service::*;
pub use payment_service::*;
