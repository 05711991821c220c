use crate::database::DbPool;
use crate::entities::{
    OrderStatus, cart_entity, cart_item_entity, movie_entity, order_entity, order_item_entity,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    AdminOrderQuery, AdminOrderResponse, OrderItemResponse, OrderMovieResponse, OrderResponse,
    OrdersResponse, PaginatedResponse, PaginationParams,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

#[derive(Clone)]
pub struct OrderService {
    pool: DbPool,
}

impl OrderService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Turns the user's cart into a pending order. Reads the cart, drops
    /// items the user may not buy again, snapshots prices, and empties the
    /// cart, all inside one transaction.
    pub async fn place_order(&self, user_id: i64) -> AppResult<OrderResponse> {
        let txn = self.pool.begin().await?;

        let cart = cart_entity::Entity::find()
            .filter(cart_entity::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or(AppError::EmptyCart)?;

        let items = cart_item_entity::Entity::find()
            .filter(cart_item_entity::Column::CartId.eq(cart.id))
            .order_by_asc(cart_item_entity::Column::AddedAt)
            .all(&txn)
            .await?;
        if items.is_empty() {
            return Err(AppError::EmptyCart);
        }

        let movie_ids: Vec<i64> = items.iter().map(|i| i.movie_id).collect();
        let movies = movie_entity::Entity::find()
            .filter(movie_entity::Column::Id.is_in(movie_ids.clone()))
            .all(&txn)
            .await?;
        let movies_by_id: HashMap<i64, movie_entity::Model> =
            movies.into_iter().map(|m| (m.id, m)).collect();

        let purchased = Self::movie_ids_in_orders(&txn, user_id, OrderStatus::Paid).await?;
        let pending = Self::movie_ids_in_orders(&txn, user_id, OrderStatus::Pending).await?;

        let valid: Vec<&movie_entity::Model> = movie_ids
            .iter()
            .filter_map(|id| movies_by_id.get(id))
            .filter(|m| m.is_available && !purchased.contains(&m.id) && !pending.contains(&m.id))
            .collect();
        if valid.is_empty() {
            return Err(AppError::NoValidItems);
        }

        let total: Decimal = valid.iter().map(|m| m.price).sum();

        let order = order_entity::ActiveModel {
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
            status: Set(OrderStatus::Pending),
            total_amount: Set(total),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let order_items: Vec<order_item_entity::ActiveModel> = valid
            .iter()
            .map(|m| order_item_entity::ActiveModel {
                order_id: Set(order.id),
                movie_id: Set(m.id),
                price_at_order: Set(m.price),
                ..Default::default()
            })
            .collect();
        order_item_entity::Entity::insert_many(order_items)
            .exec(&txn)
            .await?;

        cart_item_entity::Entity::delete_many()
            .filter(cart_item_entity::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        let order_items = valid
            .iter()
            .map(|m| OrderItemResponse {
                movie: OrderMovieResponse {
                    id: m.id,
                    name: m.name.clone(),
                },
                price_at_order: m.price,
            })
            .collect();

        Ok(OrderResponse {
            id: order.id,
            created_at: order.created_at,
            status: order.status,
            total_amount: order.total_amount,
            order_items,
        })
    }

    pub async fn list_orders(&self, user_id: i64) -> AppResult<OrdersResponse> {
        let orders = order_entity::Entity::find()
            .filter(order_entity::Column::UserId.eq(user_id))
            .order_by_desc(order_entity::Column::CreatedAt)
            .order_by_desc(order_entity::Column::Id)
            .all(&self.pool)
            .await?;

        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = order_item_entity::Entity::find()
            .filter(order_item_entity::Column::OrderId.is_in(order_ids))
            .all(&self.pool)
            .await?;

        let movie_ids: Vec<i64> = items.iter().map(|i| i.movie_id).collect();
        let movie_names: HashMap<i64, String> = movie_entity::Entity::find()
            .filter(movie_entity::Column::Id.is_in(movie_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| (m.id, m.name))
            .collect();

        let mut items_by_order: HashMap<i64, Vec<order_item_entity::Model>> = HashMap::new();
        for item in items {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let orders = orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderResponse::from_parts(order, items, &movie_names)
            })
            .collect();

        Ok(OrdersResponse { orders })
    }

    pub async fn cancel_order(&self, user_id: i64, order_id: i64) -> AppResult<()> {
        let order = order_entity::Entity::find_by_id(order_id)
            .one(&self.pool)
            .await?;
        match order {
            Some(o) if o.user_id == user_id => {}
            _ => return Err(AppError::NotFound("Order not found".to_string())),
        }

        let result = order_entity::Entity::update_many()
            .set(order_entity::ActiveModel {
                status: Set(OrderStatus::Canceled),
                ..Default::default()
            })
            .filter(order_entity::Column::Id.eq(order_id))
            .filter(order_entity::Column::Status.eq(OrderStatus::Pending))
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::InvalidState(
                "Only pending orders can be canceled".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn admin_list_orders(
        &self,
        query: &AdminOrderQuery,
    ) -> AppResult<PaginatedResponse<AdminOrderResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = order_entity::Entity::find();
        if let Some(user_id) = query.user_id {
            select = select.filter(order_entity::Column::UserId.eq(user_id));
        }
        if let Some(status) = &query.status {
            select = select.filter(order_entity::Column::Status.eq(status.clone()));
        }
        if let Some(start) = query.start_date {
            select = select.filter(order_entity::Column::CreatedAt.gte(start));
        }
        if let Some(end) = query.end_date {
            select = select.filter(order_entity::Column::CreatedAt.lte(end));
        }

        let total = select.clone().count(&self.pool).await? as i64;

        let orders = select
            .order_by_desc(order_entity::Column::CreatedAt)
            .order_by_desc(order_entity::Column::Id)
            .offset(params.get_offset() as u64)
            .limit(params.get_limit() as u64)
            .all(&self.pool)
            .await?;

        let items = orders.into_iter().map(AdminOrderResponse::from).collect();

        Ok(PaginatedResponse::new(
            items,
            params.page.unwrap_or(1).max(1),
            params.get_limit(),
            total,
        ))
    }

    /// Movie ids appearing in any of the user's orders with the given status.
    async fn movie_ids_in_orders<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
        status: OrderStatus,
    ) -> AppResult<HashSet<i64>> {
        let items = order_item_entity::Entity::find()
            .join(JoinType::InnerJoin, order_item_entity::Relation::Orders.def())
            .filter(order_entity::Column::UserId.eq(user_id))
            .filter(order_entity::Column::Status.eq(status))
            .all(db)
            .await?;
        Ok(items.into_iter().map(|i| i.movie_id).collect())
    }
}
