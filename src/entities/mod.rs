pub mod cart_items;
pub mod carts;
pub mod favorites;
pub mod genres;
pub mod movie_genres;
pub mod movies;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod refresh_tokens;
pub mod users;

pub use cart_items as cart_item_entity;
pub use carts as cart_entity;
pub use favorites as favorite_entity;
pub use genres as genre_entity;
pub use movie_genres as movie_genre_entity;
pub use movies as movie_entity;
pub use order_items as order_item_entity;
pub use orders as order_entity;
pub use payments as payment_entity;
pub use refresh_tokens as refresh_token_entity;
pub use users as user_entity;

pub use orders::OrderStatus;
pub use payments::PaymentStatus;
