use crate::handlers::authenticated_user;
use crate::services::FavoriteService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/favorites/{movie_id}",
    tag = "favorites",
    params(("movie_id" = i64, Path, description = "Movie id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Movie added to favorites"),
        (status = 404, description = "Movie not found"),
        (status = 409, description = "Movie already in favorites")
    )
)]
pub async fn add_favorite(
    favorite_service: web::Data<FavoriteService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match favorite_service.add_favorite(user.id, path.into_inner()).await {
        Ok(favorite) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": favorite
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/favorites/{movie_id}",
    tag = "favorites",
    params(("movie_id" = i64, Path, description = "Movie id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Movie removed from favorites"),
        (status = 404, description = "Movie was not in favorites")
    )
)]
pub async fn remove_favorite(
    favorite_service: web::Data<FavoriteService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match favorite_service
        .remove_favorite(user.id, path.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/favorites",
    tag = "favorites",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Favorited movies with genres"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_favorites(
    favorite_service: web::Data<FavoriteService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match authenticated_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };

    match favorite_service.list_favorites(user.id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn favorite_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/favorites")
            .route("", web::get().to(get_favorites))
            .route("/{movie_id}", web::post().to(add_favorite))
            .route("/{movie_id}", web::delete().to(remove_favorite)),
    );
}
