use crate::models::movie::GenreResponse;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FavoriteResponse {
    pub id: i64,
    pub movie_id: i64,
    pub added_at: DateTime<Utc>,
}

impl From<crate::entities::favorite_entity::Model> for FavoriteResponse {
    fn from(m: crate::entities::favorite_entity::Model) -> Self {
        Self {
            id: m.id,
            movie_id: m.movie_id,
            added_at: m.added_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FavoriteMovieResponse {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub year: i32,
    pub is_available: bool,
    pub genres: Vec<GenreResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FavoriteMoviesResponse {
    pub movies: Vec<FavoriteMovieResponse>,
}
