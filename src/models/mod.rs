pub mod auth;
pub mod cart;
pub mod common;
pub mod favorite;
pub mod movie;
pub mod order;
pub mod pagination;
pub mod payment;

pub use auth::*;
pub use cart::*;
pub use common::*;
pub use favorite::*;
pub use movie::*;
pub use order::*;
pub use pagination::*;
pub use payment::*;
