use async_trait::async_trait;
use chrono::Utc;
use cinema_backend::database::DbPool;
use cinema_backend::entities::{
    OrderStatus, PaymentStatus, cart_entity, cart_item_entity, genre_entity, movie_entity,
    movie_genre_entity, order_entity, order_item_entity, payment_entity, user_entity,
};
use cinema_backend::error::{AppError, AppResult};
use cinema_backend::external::{
    CheckoutSessionRequest, OrderNotifier, PaymentGateway,
};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fresh in-memory database with the full schema applied. A single
/// connection keeps every query on the same SQLite instance.
pub async fn setup_db() -> DbPool {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).sqlx_logging(false);
    let pool = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&pool, None).await.expect("run migrations");
    pool
}

pub async fn seed_user(pool: &DbPool, email: &str, group: &str) -> user_entity::Model {
    user_entity::ActiveModel {
        email: Set(email.to_string()),
        // Not a real hash; none of these tests log in through bcrypt.
        password_hash: Set("test-hash".to_string()),
        group_name: Set(group.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert user")
}

pub async fn seed_movie(
    pool: &DbPool,
    name: &str,
    price: Decimal,
    is_available: bool,
) -> movie_entity::Model {
    movie_entity::ActiveModel {
        name: Set(name.to_string()),
        year: Set(2024),
        price: Set(price),
        is_available: Set(is_available),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert movie")
}

#[allow(dead_code)]
pub async fn seed_genre(pool: &DbPool, name: &str, movie_id: i64) -> genre_entity::Model {
    let genre = genre_entity::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert genre");

    movie_genre_entity::ActiveModel {
        movie_id: Set(movie_id),
        genre_id: Set(genre.id),
    }
    .insert(pool)
    .await
    .expect("link genre");

    genre
}

/// Inserts an order with one item per movie, bypassing the cart.
#[allow(dead_code)]
pub async fn seed_order(
    pool: &DbPool,
    user_id: i64,
    status: OrderStatus,
    movies: &[&movie_entity::Model],
) -> order_entity::Model {
    let total: Decimal = movies.iter().map(|m| m.price).sum();
    let order = order_entity::ActiveModel {
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        status: Set(status),
        total_amount: Set(total),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert order");

    for movie in movies {
        order_item_entity::ActiveModel {
            order_id: Set(order.id),
            movie_id: Set(movie.id),
            price_at_order: Set(movie.price),
            ..Default::default()
        }
        .insert(pool)
        .await
        .expect("insert order item");
    }

    order
}

#[allow(dead_code)]
pub async fn seed_payment(
    pool: &DbPool,
    user_id: i64,
    order_id: i64,
    amount: Decimal,
    external_payment_id: Option<&str>,
) -> payment_entity::Model {
    payment_entity::ActiveModel {
        user_id: Set(user_id),
        order_id: Set(order_id),
        created_at: Set(Utc::now()),
        status: Set(PaymentStatus::Successful),
        amount: Set(amount),
        external_payment_id: Set(external_payment_id.map(str::to_string)),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert payment")
}

/// Puts a movie into the user's cart directly, bypassing the service-level
/// purchase checks. Used to stage carts that hold no-longer-orderable items.
#[allow(dead_code)]
pub async fn seed_cart_item_raw(pool: &DbPool, user_id: i64, movie_id: i64) {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    let cart = match cart_entity::Entity::find()
        .filter(cart_entity::Column::UserId.eq(user_id))
        .one(pool)
        .await
        .expect("query cart")
    {
        Some(cart) => cart,
        None => cart_entity::ActiveModel {
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(pool)
        .await
        .expect("insert cart"),
    };

    cart_item_entity::ActiveModel {
        cart_id: Set(cart.id),
        movie_id: Set(movie_id),
        added_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .expect("insert cart item");
}

/// Gateway double that records every call instead of talking to Stripe.
#[derive(Default)]
pub struct FakeGateway {
    pub checkout_requests: Mutex<Vec<CheckoutSessionRequest>>,
    pub refunds: Mutex<Vec<String>>,
    pub fail_checkout: AtomicBool,
    pub fail_refund: AtomicBool,
}

impl FakeGateway {
    #[allow(dead_code)]
    pub fn failing_refunds() -> Self {
        let gateway = Self::default();
        gateway.fail_refund.store(true, Ordering::SeqCst);
        gateway
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> AppResult<String> {
        if self.fail_checkout.load(Ordering::SeqCst) {
            return Err(AppError::GatewayError("gateway down".to_string()));
        }
        let url = format!("https://pay.example/session/{}", request.order_id);
        self.checkout_requests
            .lock()
            .expect("lock checkout requests")
            .push(request);
        Ok(url)
    }

    async fn refund(&self, external_payment_id: &str) -> AppResult<()> {
        if self.fail_refund.load(Ordering::SeqCst) {
            return Err(AppError::RefundFailed("provider said no".to_string()));
        }
        self.refunds
            .lock()
            .expect("lock refunds")
            .push(external_payment_id.to_string());
        Ok(())
    }
}

/// Notifier double; `fail` makes every send error to exercise rollback paths.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, i64)>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    #[allow(dead_code)]
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn send_order_confirmation(&self, email: &str, order_id: i64) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::MailError("smtp on fire".to_string()));
        }
        self.sent
            .lock()
            .expect("lock sent")
            .push((email.to_string(), order_id));
        Ok(())
    }
}
