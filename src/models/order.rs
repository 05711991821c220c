use crate::entities::{OrderStatus, order_entity, order_item_entity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderMovieResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub movie: OrderMovieResponse,
    pub price_at_order: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub order_items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    /// Builds the response from an order, its items and a movie-id -> name map.
    pub fn from_parts(
        order: order_entity::Model,
        items: Vec<order_item_entity::Model>,
        movie_names: &std::collections::HashMap<i64, String>,
    ) -> Self {
        let order_items = items
            .into_iter()
            .map(|item| OrderItemResponse {
                movie: OrderMovieResponse {
                    id: item.movie_id,
                    name: movie_names
                        .get(&item.movie_id)
                        .cloned()
                        .unwrap_or_default(),
                },
                price_at_order: item.price_at_order,
            })
            .collect();

        Self {
            id: order.id,
            created_at: order.created_at,
            status: order.status,
            total_amount: order.total_amount,
            order_items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrdersResponse {
    pub orders: Vec<OrderResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminOrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<order_entity::Model> for AdminOrderResponse {
    fn from(m: order_entity::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            status: m.status,
            total_amount: m.total_amount,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminOrderQuery {
    pub user_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentUrlResponse {
    pub payment_url: String,
}
