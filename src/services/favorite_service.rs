use crate::database::DbPool;
use crate::entities::{favorite_entity, genre_entity, movie_entity, movie_genre_entity};
use crate::error::{AppError, AppResult};
use crate::models::{FavoriteMovieResponse, FavoriteMoviesResponse, FavoriteResponse, GenreResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, LoaderTrait, QueryFilter, QueryOrder, SqlErr, Set,
};
use std::collections::HashMap;

/// Favorites are a plain bookmark list. Unlike the cart, shelved movies may
/// stay favorited; availability only matters at purchase time.
#[derive(Clone)]
pub struct FavoriteService {
    pool: DbPool,
}

impl FavoriteService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn add_favorite(&self, user_id: i64, movie_id: i64) -> AppResult<FavoriteResponse> {
        let movie = movie_entity::Entity::find_by_id(movie_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

        let existing = favorite_entity::Entity::find()
            .filter(favorite_entity::Column::UserId.eq(user_id))
            .filter(favorite_entity::Column::MovieId.eq(movie.id))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "Movie is already in your favorites".to_string(),
            ));
        }

        let favorite = favorite_entity::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(movie.id),
            added_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Movie is already in your favorites".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(FavoriteResponse::from(favorite))
    }

    /// Removing a movie that was never favorited is an error, matching the
    /// add/remove symmetry of a bookmark list.
    pub async fn remove_favorite(&self, user_id: i64, movie_id: i64) -> AppResult<()> {
        let result = favorite_entity::Entity::delete_many()
            .filter(favorite_entity::Column::UserId.eq(user_id))
            .filter(favorite_entity::Column::MovieId.eq(movie_id))
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(
                "Movie not found in your favorites".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn list_favorites(&self, user_id: i64) -> AppResult<FavoriteMoviesResponse> {
        let favorites = favorite_entity::Entity::find()
            .filter(favorite_entity::Column::UserId.eq(user_id))
            .order_by_asc(favorite_entity::Column::AddedAt)
            .order_by_asc(favorite_entity::Column::Id)
            .all(&self.pool)
            .await?;

        let movie_ids: Vec<i64> = favorites.iter().map(|f| f.movie_id).collect();
        let movies = movie_entity::Entity::find()
            .filter(movie_entity::Column::Id.is_in(movie_ids.clone()))
            .all(&self.pool)
            .await?;

        let genres = movies
            .load_many_to_many(genre_entity::Entity, movie_genre_entity::Entity, &self.pool)
            .await?;

        let mut by_id: HashMap<i64, FavoriteMovieResponse> = movies
            .into_iter()
            .zip(genres)
            .map(|(movie, genres)| {
                (
                    movie.id,
                    FavoriteMovieResponse {
                        id: movie.id,
                        name: movie.name,
                        price: movie.price,
                        year: movie.year,
                        is_available: movie.is_available,
                        genres: genres.into_iter().map(GenreResponse::from).collect(),
                    },
                )
            })
            .collect();

        let movies = movie_ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .collect();

        Ok(FavoriteMoviesResponse { movies })
    }
}
