mod common;

use cinema_backend::entities::{OrderStatus, movie_entity};
use cinema_backend::error::AppError;
use cinema_backend::models::AdminOrderQuery;
use cinema_backend::services::{CartService, OrderService};
use common::{seed_movie, seed_order, seed_user, setup_db};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue, Set};

#[tokio::test]
async fn place_order_snapshots_prices_and_empties_the_cart() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "alice@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;

    let cart = CartService::new(pool.clone());
    let orders = OrderService::new(pool.clone());

    cart.add_item(user.id, movie.id).await.unwrap();
    let order = orders.place_order(user.id).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Decimal::new(999, 2));
    assert_eq!(order.order_items.len(), 1);
    assert_eq!(order.order_items[0].price_at_order, Decimal::new(999, 2));
    assert_eq!(order.order_items[0].movie.name, "Heat");

    // Catalog price changes after ordering must not leak into the order.
    movie_entity::ActiveModel {
        id: ActiveValue::Unchanged(movie.id),
        price: Set(Decimal::new(1499, 2)),
        ..Default::default()
    }
    .update(&pool)
    .await
    .unwrap();

    let listed = orders.list_orders(user.id).await.unwrap();
    assert_eq!(listed.orders.len(), 1);
    assert_eq!(listed.orders[0].total_amount, Decimal::new(999, 2));
    assert_eq!(
        listed.orders[0].order_items[0].price_at_order,
        Decimal::new(999, 2)
    );

    // The cart was emptied in the same transaction.
    let listing = cart.list_items(user.id).await.unwrap();
    assert!(listing.movies.is_empty());

    // So a second placement finds nothing to order.
    assert!(matches!(
        orders.place_order(user.id).await,
        Err(AppError::EmptyCart)
    ));
}

#[tokio::test]
async fn empty_cart_cannot_be_ordered() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "bob@example.com", "user").await;
    let orders = OrderService::new(pool.clone());

    assert!(matches!(
        orders.place_order(user.id).await,
        Err(AppError::EmptyCart)
    ));
}

#[tokio::test]
async fn invalid_items_are_dropped_from_the_order() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "carol@example.com", "user").await;
    let owned = seed_movie(&pool, "Owned", Decimal::new(500, 2), true).await;
    let fresh = seed_movie(&pool, "Fresh", Decimal::new(750, 2), true).await;
    seed_order(&pool, user.id, OrderStatus::Paid, &[&owned]).await;

    let cart = CartService::new(pool.clone());
    let orders = OrderService::new(pool.clone());

    // The paid copy slipped into the cart before the purchase; place_order
    // must drop it and charge only for the fresh title.
    cart.add_item(user.id, fresh.id).await.unwrap();
    common::seed_cart_item_raw(&pool, user.id, owned.id).await;

    let order = orders.place_order(user.id).await.unwrap();
    assert_eq!(order.order_items.len(), 1);
    assert_eq!(order.order_items[0].movie.id, fresh.id);
    assert_eq!(order.total_amount, Decimal::new(750, 2));
}

#[tokio::test]
async fn order_with_no_orderable_items_fails() {
    let pool = setup_db().await;
    let user = seed_user(&pool, "dan@example.com", "user").await;
    let owned = seed_movie(&pool, "Owned", Decimal::new(500, 2), true).await;
    seed_order(&pool, user.id, OrderStatus::Paid, &[&owned]).await;

    let orders = OrderService::new(pool.clone());
    common::seed_cart_item_raw(&pool, user.id, owned.id).await;

    assert!(matches!(
        orders.place_order(user.id).await,
        Err(AppError::NoValidItems)
    ));
}

#[tokio::test]
async fn cancel_is_pending_only_and_owner_only() {
    let pool = setup_db().await;
    let alice = seed_user(&pool, "alice@example.com", "user").await;
    let mallory = seed_user(&pool, "mallory@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    let order = seed_order(&pool, alice.id, OrderStatus::Pending, &[&movie]).await;

    let orders = OrderService::new(pool.clone());

    // Someone else's order looks like it does not exist.
    assert!(matches!(
        orders.cancel_order(mallory.id, order.id).await,
        Err(AppError::NotFound(_))
    ));

    orders.cancel_order(alice.id, order.id).await.unwrap();

    // The second cancel finds no pending row to flip.
    assert!(matches!(
        orders.cancel_order(alice.id, order.id).await,
        Err(AppError::InvalidState(_))
    ));

    let paid = seed_order(&pool, alice.id, OrderStatus::Paid, &[&movie]).await;
    assert!(matches!(
        orders.cancel_order(alice.id, paid.id).await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn admin_listing_filters_by_user_and_status() {
    let pool = setup_db().await;
    let alice = seed_user(&pool, "alice@example.com", "user").await;
    let bob = seed_user(&pool, "bob@example.com", "user").await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;

    seed_order(&pool, alice.id, OrderStatus::Paid, &[&movie]).await;
    seed_order(&pool, alice.id, OrderStatus::Pending, &[&movie]).await;
    seed_order(&pool, bob.id, OrderStatus::Paid, &[&movie]).await;

    let orders = OrderService::new(pool.clone());

    let all = orders
        .admin_list_orders(&AdminOrderQuery {
            user_id: None,
            status: None,
            start_date: None,
            end_date: None,
            page: None,
            per_page: None,
        })
        .await
        .unwrap();
    assert_eq!(all.total, 3);

    let alices = orders
        .admin_list_orders(&AdminOrderQuery {
            user_id: Some(alice.id),
            status: None,
            start_date: None,
            end_date: None,
            page: None,
            per_page: None,
        })
        .await
        .unwrap();
    assert_eq!(alices.total, 2);
    assert!(alices.data.iter().all(|o| o.user_id == alice.id));

    let paid = orders
        .admin_list_orders(&AdminOrderQuery {
            user_id: None,
            status: Some(OrderStatus::Paid),
            start_date: None,
            end_date: None,
            page: None,
            per_page: None,
        })
        .await
        .unwrap();
    assert_eq!(paid.total, 2);
    assert!(paid.data.iter().all(|o| o.status == OrderStatus::Paid));
}
