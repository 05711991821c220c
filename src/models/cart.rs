use crate::models::movie::GenreResponse;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieInCartResponse {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub year: i32,
    pub genres: Vec<GenreResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartMoviesResponse {
    pub movies: Vec<MovieInCartResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    pub id: i64,
    pub cart_id: i64,
    pub movie_id: i64,
    pub added_at: DateTime<Utc>,
}

impl From<crate::entities::cart_item_entity::Model> for CartItemResponse {
    fn from(m: crate::entities::cart_item_entity::Model) -> Self {
        Self {
            id: m.id,
            cart_id: m.cart_id,
            movie_id: m.movie_id,
            added_at: m.added_at,
        }
    }
}
