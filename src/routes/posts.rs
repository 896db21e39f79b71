use axum::extract::State;
use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::middleware::require_token;
use crate::db::models::Post;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

const MAX_CONTENT_LEN: usize = 2000;

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/resources/posts",
            get(list_posts).post(create_post),
        )
        .route("/api/v1/resources/posts/myposts", get(my_posts))
        .route_layer(middleware::from_fn_with_state(
            state.protected.clone(),
            require_token,
        ))
}

async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<Json<Value>> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::BadRequest("Post content cannot be empty".into()));
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(AppError::BadRequest(format!(
            "Post content must be {} characters or less",
            MAX_CONTENT_LEN
        )));
    }

    let post = Post {
        id: uuid::Uuid::now_v7().to_string(),
        user_id: user.id,
        content,
        created_at: Utc::now(),
    };
    state.posts.create(&post).await?;

    Ok(Json(json!({
        "message": "A new post has been created.",
        "post_id": post.id,
    })))
}

async fn list_posts(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Value>> {
    let posts = state.posts.list().await?;
    Ok(Json(json!({ "posts": posts })))
}

async fn my_posts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Value>> {
    let posts = state.posts.list_by_user(&user.id).await?;
    if posts.is_empty() {
        return Ok(Json(
            json!({ "message": "There are no posts in your account" }),
        ));
    }

    let posts: Vec<Value> = posts
        .into_iter()
        .map(|p| json!({ "id": p.id, "content": p.content, "posted_on": p.created_at }))
        .collect();
    Ok(Json(json!({ "user": user.username, "posts": posts })))
}
