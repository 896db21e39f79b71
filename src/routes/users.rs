use axum::extract::{Path, State};
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::middleware::require_token;
use crate::db::models::Identity;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

const MAX_USERNAME_LEN: usize = 20;
const MAX_EMAIL_LEN: usize = 100;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn router(state: &AppState) -> Router<AppState> {
    let guard = middleware::from_fn_with_state(state.protected.clone(), require_token);

    Router::new()
        .route(
            "/api/v1/resources/users",
            post(signup).merge(get(list_users).route_layer(guard.clone())),
        )
        .route(
            "/api/v1/resources/users/{username}",
            get(get_user).route_layer(guard),
        )
}

/// POST /api/v1/resources/users: create an account
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<Json<Value>> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Username must be 1 to {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if !email.contains('@') || email.len() > MAX_EMAIL_LEN {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    let now = Utc::now();
    let identity = Identity {
        id: uuid::Uuid::now_v7().to_string(),
        username,
        email,
        password_hash: state.credentials.hasher().hash(&req.password)?,
        last_seen: now,
        last_activity: now,
        created_at: now,
    };
    state.identities.create(&identity).await?;

    tracing::info!(user = %identity.username, "account created");
    Ok(Json(json!({ "message": "A new user has been created!" })))
}

/// GET /api/v1/resources/users
async fn list_users(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Value>> {
    let usernames: Vec<String> = state
        .identities
        .list()
        .await?
        .into_iter()
        .map(|identity| identity.username)
        .collect();
    Ok(Json(json!({ "users": usernames })))
}

/// GET /api/v1/resources/users/{username}
async fn get_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<Value>> {
    let Some(identity) = state.identities.find_by_username(&username).await? else {
        return Ok(Json(json!({ "message": "No user found" })));
    };

    let post_count = state.posts.count_by_user(&identity.id).await?;
    Ok(Json(json!({
        "user": {
            "username": identity.username,
            "email": identity.email,
            "last_logged_in": identity.last_seen,
            "last_activity": identity.last_activity,
            "number_of_posts": post_count,
        }
    })))
}
