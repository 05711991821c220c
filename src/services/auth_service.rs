use crate::database::DbPool;
use crate::entities::{refresh_token_entity, user_entity};
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::utils::jwt::JwtService;
use crate::utils::password::{hash_password, verify_password};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt: JwtService) -> Self {
        Self { pool, jwt }
    }

    pub async fn register(&self, req: RegisterRequest) -> AppResult<AuthResponse> {
        if !req.email.contains('@') {
            return Err(AppError::ValidationError("Invalid email address".to_string()));
        }
        if req.password.len() < 8 {
            return Err(AppError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let existing = user_entity::Entity::find()
            .filter(user_entity::Column::Email.eq(req.email.clone()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_password(&req.password)?;
        let user = user_entity::ActiveModel {
            email: Set(req.email),
            password_hash: Set(password_hash),
            group_name: Set("user".to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        self.issue_tokens(user).await
    }

    pub async fn login(&self, req: LoginRequest) -> AppResult<AuthResponse> {
        let user = user_entity::Entity::find()
            .filter(user_entity::Column::Email.eq(req.email.clone()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !verify_password(&req.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        self.issue_tokens(user).await
    }

    /// Exchanges a valid, stored refresh token for a new token pair. The old
    /// token is revoked so each refresh token is usable exactly once.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

        let txn = self.pool.begin().await?;

        let stored = refresh_token_entity::Entity::find()
            .filter(refresh_token_entity::Column::Token.eq(refresh_token))
            .filter(refresh_token_entity::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::AuthError("Refresh token has been revoked".to_string()))?;

        if stored.expires_at < Utc::now() {
            return Err(AppError::AuthError("Refresh token has expired".to_string()));
        }

        refresh_token_entity::Entity::delete_by_id(stored.id)
            .exec(&txn)
            .await?;

        let user = user_entity::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

        let response = self.build_token_pair(&txn, user).await?;
        txn.commit().await?;
        Ok(response)
    }

    /// Revokes every stored refresh token of the user.
    pub async fn logout(&self, user_id: i64) -> AppResult<()> {
        refresh_token_entity::Entity::delete_many()
            .filter(refresh_token_entity::Column::UserId.eq(user_id))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes expired refresh tokens. Called by the background janitor.
    pub async fn delete_expired_tokens(&self) -> AppResult<u64> {
        let result = refresh_token_entity::Entity::delete_many()
            .filter(refresh_token_entity::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }

    async fn issue_tokens(&self, user: user_entity::Model) -> AppResult<AuthResponse> {
        let txn = self.pool.begin().await?;
        let response = self.build_token_pair(&txn, user).await?;
        txn.commit().await?;
        Ok(response)
    }

    async fn build_token_pair<C>(&self, db: &C, user: user_entity::Model) -> AppResult<AuthResponse>
    where
        C: sea_orm::ConnectionTrait,
    {
        let access_token = self.jwt.generate_access_token(user.id, &user.group_name)?;
        let refresh_token = self.jwt.generate_refresh_token(user.id, &user.group_name)?;

        let expires_at =
            Utc::now() + Duration::seconds(self.jwt.get_refresh_token_expires_in());
        refresh_token_entity::ActiveModel {
            user_id: Set(user.id),
            token: Set(refresh_token.clone()),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.get_access_token_expires_in(),
            user: UserResponse::from(user),
        })
    }
}
