use crate::models::MovieQuery;
use crate::services::CatalogService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/movies",
    tag = "catalog",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Page size"),
        ("search" = Option<String>, Query, description = "Substring filter on the movie name")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Paginated movie listing"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_movies(
    catalog_service: web::Data<CatalogService>,
    query: web::Query<MovieQuery>,
) -> Result<HttpResponse> {
    match catalog_service.list_movies(&query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/movies/{movie_id}",
    tag = "catalog",
    params(("movie_id" = i64, Path, description = "Movie id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Movie detail with genres"),
        (status = 404, description = "Movie not found")
    )
)]
pub async fn get_movie(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match catalog_service.get_movie(path.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn movie_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/movies")
            .route("", web::get().to(get_movies))
            .route("/{movie_id}", web::get().to(get_movie)),
    );
}
