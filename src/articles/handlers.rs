use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    articles::{dto::{CreateArticleRequest, ListFilter}, repo::Article, update::ArticleUpdate},
    auth::extractors::AuthUser,
    error::ApiError,
    state::AppState,
};

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn list_articles(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<ListFilter>,
) -> Result<Json<Value>, ApiError> {
    let items =
        Article::list_by_user(&state.db, user.id, filter.archived, filter.favorited).await?;
    Ok(Json(json!({ "items": items })))
}

#[instrument(skip(state, user, body), fields(user_id = user.id))]
pub async fn create_article(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let req = CreateArticleRequest::parse(&body)?;
    let article =
        Article::create(&state.db, user.id, &req.url, req.archived, req.favorited).await?;
    info!(article_id = article.id, "article created");
    Ok((StatusCode::CREATED, Json(article)))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn get_article(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    let article = Article::get(&state.db, id, user.id)
        .await?
        .ok_or(ApiError::NotFound("Not found"))?;
    Ok(Json(article))
}

#[instrument(skip(state, user, body), fields(user_id = user.id))]
pub async fn update_article(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Article>, ApiError> {
    let update = ArticleUpdate::parse(&body)?;
    let article = Article::update(&state.db, id, user.id, &update)
        .await?
        .ok_or(ApiError::NotFound("Not found"))?;
    Ok(Json(article))
}

#[instrument(skip(state, user), fields(user_id = user.id))]
pub async fn delete_article(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = Article::delete(&state.db, id, user.id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Not found"));
    }
    info!(article_id = id, "article deleted");
    Ok(StatusCode::NO_CONTENT)
}
