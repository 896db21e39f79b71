use axum::extract::{Query, State};
use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::middleware::require_token;
use crate::db::models::LikeEvent;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LikeQuery {
    pub post_id: String,
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/resources/likes",
            get(list_likes).post(like).delete(unlike),
        )
        .route("/api/v1/resources/likes/mylikes", get(my_likes))
        .route_layer(middleware::from_fn_with_state(
            state.protected.clone(),
            require_token,
        ))
}

fn message(text: impl Into<String>) -> Json<Value> {
    Json(json!({ "message": text.into() }))
}

/// POST /api/v1/resources/likes?post_id=
async fn like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<LikeQuery>,
) -> AppResult<Json<Value>> {
    if state.likes.find(&user.id, &q.post_id).await?.is_some() {
        return Ok(message("You have already liked this post."));
    }
    if state.posts.find(&q.post_id).await?.is_none() {
        return Ok(message("There is no such post"));
    }

    let inserted = state.likes.create(&LikeEvent::new(&user.id, &q.post_id)).await?;
    if !inserted {
        // Lost a race with a concurrent like from the same user
        return Ok(message("You have already liked this post."));
    }

    tracing::debug!(user = %user.username, post = %q.post_id, "liked");
    Ok(message(format!("You have put a like to post {}", q.post_id)))
}

/// DELETE /api/v1/resources/likes?post_id=
async fn unlike(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(q): Query<LikeQuery>,
) -> AppResult<Json<Value>> {
    let Some(existing) = state.likes.find(&user.id, &q.post_id).await? else {
        return Ok(message("This post has no likes by you"));
    };

    state.likes.delete(&existing).await?;
    Ok(message("You have unliked this post"))
}

async fn list_likes(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Value>> {
    let likes = state.likes.list().await?;
    if likes.is_empty() {
        return Ok(message("There are no likes so far."));
    }
    Ok(Json(json!({ "likes": likes })))
}

async fn my_likes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    let likes = state.likes.list_by_user(&user.id).await?;
    if likes.is_empty() {
        return Ok(message("You have not put any likes so far."));
    }
    Ok(Json(json!({ "user": user.username, "likes": likes })))
}
