mod common;

use cinema_backend::error::AppError;
use cinema_backend::models::MovieQuery;
use cinema_backend::services::CatalogService;
use common::{seed_genre, seed_movie, setup_db};
use rust_decimal::Decimal;

#[tokio::test]
async fn listing_paginates_and_filters_by_name() {
    let pool = setup_db().await;
    for i in 1..=5 {
        seed_movie(&pool, &format!("Heat {i}"), Decimal::new(999, 2), true).await;
    }
    seed_movie(&pool, "Ronin", Decimal::new(1299, 2), true).await;

    let catalog = CatalogService::new(pool.clone());

    let page = catalog
        .list_movies(&MovieQuery {
            page: Some(1),
            per_page: Some(4),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert_eq!(page.data.len(), 4);
    assert_eq!(page.total_pages, 2);

    let rest = catalog
        .list_movies(&MovieQuery {
            page: Some(2),
            per_page: Some(4),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(rest.data.len(), 2);

    let heats = catalog
        .list_movies(&MovieQuery {
            page: None,
            per_page: None,
            search: Some("Heat".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(heats.total, 5);
    assert!(heats.data.iter().all(|m| m.name.starts_with("Heat")));
}

#[tokio::test]
async fn detail_carries_genres_and_missing_movies_are_not_found() {
    let pool = setup_db().await;
    let movie = seed_movie(&pool, "Heat", Decimal::new(999, 2), true).await;
    seed_genre(&pool, "Thriller", movie.id).await;
    seed_genre(&pool, "Crime", movie.id).await;

    let catalog = CatalogService::new(pool.clone());

    let detail = catalog.get_movie(movie.id).await.unwrap();
    assert_eq!(detail.name, "Heat");
    assert_eq!(detail.price, Decimal::new(999, 2));
    assert_eq!(detail.genres.len(), 2);

    assert!(matches!(
        catalog.get_movie(999).await,
        Err(AppError::NotFound(_))
    ));
}
