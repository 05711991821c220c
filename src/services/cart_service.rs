use crate::database::DbPool;
use crate::entities::{
    OrderStatus, cart_entity, cart_item_entity, genre_entity, movie_entity, movie_genre_entity,
    order_entity, order_item_entity,
};
use crate::error::{AppError, AppResult};
use crate::models::{CartItemResponse, CartMoviesResponse, GenreResponse, MovieInCartResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, LoaderTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, SqlErr, Set,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct CartService {
    pool: DbPool,
}

impl CartService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn add_item(&self, user_id: i64, movie_id: i64) -> AppResult<CartItemResponse> {
        let movie = movie_entity::Entity::find_by_id(movie_id)
            .one(&self.pool)
            .await?;
        let movie = match movie {
            Some(m) if m.is_available => m,
            _ => return Err(AppError::NotFound("Movie not found".to_string())),
        };

        let purchased = order_item_entity::Entity::find()
            .filter(order_item_entity::Column::MovieId.eq(movie.id))
            .join(JoinType::InnerJoin, order_item_entity::Relation::Orders.def())
            .filter(order_entity::Column::UserId.eq(user_id))
            .filter(order_entity::Column::Status.eq(OrderStatus::Paid))
            .count(&self.pool)
            .await?;
        if purchased > 0 {
            return Err(AppError::AlreadyPurchased);
        }

        let cart = self.get_or_create_cart(user_id).await?;

        let existing = cart_item_entity::Entity::find()
            .filter(cart_item_entity::Column::CartId.eq(cart.id))
            .filter(cart_item_entity::Column::MovieId.eq(movie.id))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "Movie is already in the cart".to_string(),
            ));
        }

        // The (cart_id, movie_id) unique index backs this up: a concurrent
        // duplicate insert fails there instead of creating a second row.
        let item = cart_item_entity::ActiveModel {
            cart_id: Set(cart.id),
            movie_id: Set(movie.id),
            added_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Movie is already in the cart".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(CartItemResponse::from(item))
    }

    /// Removing an item that is not there is not an error.
    pub async fn remove_item(&self, user_id: i64, movie_id: i64) -> AppResult<()> {
        let Some(cart) = self.find_cart(user_id).await? else {
            return Ok(());
        };

        cart_item_entity::Entity::delete_many()
            .filter(cart_item_entity::Column::CartId.eq(cart.id))
            .filter(cart_item_entity::Column::MovieId.eq(movie_id))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear(&self, user_id: i64) -> AppResult<()> {
        let Some(cart) = self.find_cart(user_id).await? else {
            return Ok(());
        };

        cart_item_entity::Entity::delete_many()
            .filter(cart_item_entity::Column::CartId.eq(cart.id))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_items(&self, user_id: i64) -> AppResult<CartMoviesResponse> {
        let Some(cart) = self.find_cart(user_id).await? else {
            return Ok(CartMoviesResponse { movies: vec![] });
        };

        let items = cart_item_entity::Entity::find()
            .filter(cart_item_entity::Column::CartId.eq(cart.id))
            .order_by_asc(cart_item_entity::Column::AddedAt)
            .all(&self.pool)
            .await?;

        let movie_ids: Vec<i64> = items.iter().map(|i| i.movie_id).collect();
        let movies = movie_entity::Entity::find()
            .filter(movie_entity::Column::Id.is_in(movie_ids.clone()))
            .all(&self.pool)
            .await?;

        let genres = movies
            .load_many_to_many(genre_entity::Entity, movie_genre_entity::Entity, &self.pool)
            .await?;

        let mut by_id: HashMap<i64, MovieInCartResponse> = movies
            .into_iter()
            .zip(genres)
            .map(|(movie, genres)| {
                (
                    movie.id,
                    MovieInCartResponse {
                        id: movie.id,
                        name: movie.name,
                        price: movie.price,
                        year: movie.year,
                        genres: genres.into_iter().map(GenreResponse::from).collect(),
                    },
                )
            })
            .collect();

        // Preserve the order the items were added in.
        let movies = movie_ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .collect();

        Ok(CartMoviesResponse { movies })
    }

    async fn find_cart(&self, user_id: i64) -> AppResult<Option<cart_entity::Model>> {
        Ok(cart_entity::Entity::find()
            .filter(cart_entity::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?)
    }

    /// Select-then-insert with a re-select fallback. Two concurrent callers
    /// may both miss the select; the unique index on user_id makes one insert
    /// fail, and that caller picks up the winner's row.
    async fn get_or_create_cart(&self, user_id: i64) -> AppResult<cart_entity::Model> {
        if let Some(cart) = self.find_cart(user_id).await? {
            return Ok(cart);
        }
        self.create_cart(user_id).await
    }

    /// Inserts the user's cart row, tolerating a concurrent winner: when the
    /// insert hits the unique index, the winner's row is returned instead.
    pub async fn create_cart(&self, user_id: i64) -> AppResult<cart_entity::Model> {
        let inserted = cart_entity::ActiveModel {
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(&self.pool)
        .await;

        match inserted {
            Ok(cart) => Ok(cart),
            Err(insert_err) => match self.find_cart(user_id).await? {
                Some(cart) => Ok(cart),
                None => Err(AppError::DatabaseError(insert_err)),
            },
        }
    }
}
