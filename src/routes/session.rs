use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::extractors::BasicCredentials;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/login", get(login))
}

/// GET /api/v1/login exchanges Basic credentials for a session token
async fn login(
    State(state): State<AppState>,
    creds: BasicCredentials,
) -> AppResult<Json<Value>> {
    let identity = state
        .credentials
        .verify(&creds.username, &creds.password)
        .await
        .inspect_err(|_| tracing::debug!("login refused"))?;

    let token = state.tokens.issue(&identity, state.tokens.default_ttl())?;

    // Only a login that produced a token counts as the last login
    state.login_observers.run(&identity).await;

    tracing::info!(user = %identity.username, "logged in");
    Ok(Json(json!({ "token": token })))
}
