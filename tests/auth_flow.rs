mod common;

use chrono::{Duration, Utc};
use cinema_backend::entities::refresh_token_entity;
use cinema_backend::error::AppError;
use cinema_backend::models::{LoginRequest, RegisterRequest};
use cinema_backend::services::AuthService;
use cinema_backend::utils::JwtService;
use common::{seed_user, setup_db};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

fn jwt() -> JwtService {
    JwtService::new("integration-test-secret", 3600, 86400)
}

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "correct horse battery".to_string(),
    }
}

#[tokio::test]
async fn register_then_login() {
    let pool = setup_db().await;
    let auth = AuthService::new(pool.clone(), jwt());

    let registered = auth.register(register_request("alice@example.com")).await.unwrap();
    assert_eq!(registered.user.email, "alice@example.com");
    assert_eq!(registered.user.group_name, "user");
    assert_eq!(registered.token_type, "Bearer");

    let logged_in = auth
        .login(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "correct horse battery".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(logged_in.user.id, registered.user.id);

    assert!(matches!(
        auth.login(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await,
        Err(AppError::AuthError(_))
    ));
}

#[tokio::test]
async fn duplicate_email_and_weak_credentials_are_rejected() {
    let pool = setup_db().await;
    let auth = AuthService::new(pool.clone(), jwt());

    auth.register(register_request("alice@example.com")).await.unwrap();
    assert!(matches!(
        auth.register(register_request("alice@example.com")).await,
        Err(AppError::Conflict(_))
    ));

    assert!(matches!(
        auth.register(register_request("not-an-email")).await,
        Err(AppError::ValidationError(_))
    ));
    assert!(matches!(
        auth.register(RegisterRequest {
            email: "bob@example.com".to_string(),
            password: "short".to_string(),
        })
        .await,
        Err(AppError::ValidationError(_))
    ));
}

#[tokio::test]
async fn refresh_rotates_and_invalidates_the_previous_token() {
    let pool = setup_db().await;
    let auth = AuthService::new(pool.clone(), jwt());

    let initial = auth.register(register_request("alice@example.com")).await.unwrap();

    let rotated = auth.refresh(&initial.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, initial.refresh_token);

    // The consumed token is gone from the store.
    assert!(matches!(
        auth.refresh(&initial.refresh_token).await,
        Err(AppError::AuthError(_))
    ));

    // The rotated one still works.
    auth.refresh(&rotated.refresh_token).await.unwrap();
}

#[tokio::test]
async fn logout_revokes_stored_refresh_tokens() {
    let pool = setup_db().await;
    let auth = AuthService::new(pool.clone(), jwt());

    let session = auth.register(register_request("alice@example.com")).await.unwrap();
    auth.logout(session.user.id).await.unwrap();

    assert!(matches!(
        auth.refresh(&session.refresh_token).await,
        Err(AppError::AuthError(_))
    ));
}

#[tokio::test]
async fn janitor_removes_only_expired_tokens() {
    let pool = setup_db().await;
    let auth = AuthService::new(pool.clone(), jwt());
    let user = seed_user(&pool, "alice@example.com", "user").await;

    refresh_token_entity::ActiveModel {
        user_id: Set(user.id),
        token: Set("expired-token".to_string()),
        expires_at: Set(Utc::now() - Duration::hours(1)),
        created_at: Set(Utc::now() - Duration::days(30)),
        ..Default::default()
    }
    .insert(&pool)
    .await
    .unwrap();
    refresh_token_entity::ActiveModel {
        user_id: Set(user.id),
        token: Set("live-token".to_string()),
        expires_at: Set(Utc::now() + Duration::days(1)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&pool)
    .await
    .unwrap();

    let removed = auth.delete_expired_tokens().await.unwrap();
    assert_eq!(removed, 1);

    let remaining = refresh_token_entity::Entity::find()
        .filter(refresh_token_entity::Column::UserId.eq(user.id))
        .all(&pool)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].token, "live-token");
}
