use crate::entities::{genre_entity, movie_entity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenreResponse {
    pub id: i64,
    pub name: String,
}

impl From<genre_entity::Model> for GenreResponse {
    fn from(m: genre_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieResponse {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub price: Decimal,
    pub is_available: bool,
    pub genres: Vec<GenreResponse>,
}

impl MovieResponse {
    pub fn from_model(m: movie_entity::Model, genres: Vec<genre_entity::Model>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            year: m.year,
            price: m.price,
            is_available: m.is_available,
            genres: genres.into_iter().map(GenreResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MovieQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Substring match on the movie name.
    pub search: Option<String>,
}
