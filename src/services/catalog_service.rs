use crate::database::DbPool;
use crate::entities::{genre_entity, movie_entity, movie_genre_entity};
use crate::error::{AppError, AppResult};
use crate::models::{MovieQuery, MovieResponse, PaginatedResponse, PaginationParams};
use sea_orm::{
    ColumnTrait, EntityTrait, LoaderTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Read-mostly catalog access. The cart and order services go through
/// `get_movie` for price and availability.
#[derive(Clone)]
pub struct CatalogService {
    pool: DbPool,
}

impl CatalogService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_movies(
        &self,
        query: &MovieQuery,
    ) -> AppResult<PaginatedResponse<MovieResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = movie_entity::Entity::find();
        if let Some(search) = &query.search
            && !search.is_empty()
        {
            select = select.filter(movie_entity::Column::Name.contains(search));
        }

        let total = select.clone().count(&self.pool).await? as i64;

        let movies = select
            .order_by_asc(movie_entity::Column::Id)
            .offset(params.get_offset() as u64)
            .limit(params.get_limit() as u64)
            .all(&self.pool)
            .await?;

        let genres = movies
            .load_many_to_many(genre_entity::Entity, movie_genre_entity::Entity, &self.pool)
            .await?;

        let items = movies
            .into_iter()
            .zip(genres)
            .map(|(movie, genres)| MovieResponse::from_model(movie, genres))
            .collect();

        Ok(PaginatedResponse::new(
            items,
            params.page.unwrap_or(1).max(1),
            params.get_limit(),
            total,
        ))
    }

    pub async fn get_movie(&self, movie_id: i64) -> AppResult<MovieResponse> {
        let movie = movie_entity::Entity::find_by_id(movie_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

        let genres = movie.find_related(genre_entity::Entity).all(&self.pool).await?;

        Ok(MovieResponse::from_model(movie, genres))
    }
}
