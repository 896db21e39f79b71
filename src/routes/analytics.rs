use axum::extract::{Path, Query, State};
use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::analytics::{bucket_by_day, day_window};
use crate::auth::middleware::require_token;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Deserialize)]
pub struct DateRangeQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

pub fn router(state: &AppState) -> Router<AppState> {
    let protected = middleware::from_fn_with_state(state.protected.clone(), require_token);
    // Reading someone's activity stamps must not move the reader's own
    let reporting = middleware::from_fn_with_state(state.reporting.clone(), require_token);

    Router::new()
        .route(
            "/api/v1/analytics/likes",
            get(likes_by_day).route_layer(protected),
        )
        .route(
            "/api/v1/analytics/users/{username}",
            get(user_activity).route_layer(reporting),
        )
}

fn parse_date(name: &str, raw: Option<&str>) -> AppResult<NaiveDate> {
    let raw = raw.ok_or_else(|| AppError::BadRequest(format!("{} is required", name)))?;
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AppError::BadRequest(format!("{} must be a YYYY-MM-DD date", name)))
}

/// GET /api/v1/analytics/likes?date_from=YYYY-MM-DD&date_to=YYYY-MM-DD
async fn likes_by_day(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(q): Query<DateRangeQuery>,
) -> AppResult<Json<Value>> {
    let date_from = parse_date("date_from", q.date_from.as_deref())?;
    let date_to = parse_date("date_to", q.date_to.as_deref())?;
    if date_from > date_to {
        return Err(AppError::BadRequest(
            "date_from must not be after date_to".into(),
        ));
    }

    let (start, end) = day_window(date_from, date_to)
        .ok_or_else(|| AppError::BadRequest("date_to is out of range".into()))?;
    let stamps = state.likes.timestamps_between(start, end).await?;
    let buckets = bucket_by_day(stamps, date_from, date_to);

    Ok(Json(json!({ "likes": buckets })))
}

/// GET /api/v1/analytics/users/{username}
async fn user_activity(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<Value>> {
    let Some(identity) = state.identities.find_by_username(&username).await? else {
        return Ok(Json(json!({ "message": "There is no such user." })));
    };

    Ok(Json(json!({
        "user": identity.username,
        "last_logged_in": identity.last_seen,
        "last_activity": identity.last_activity,
    })))
}
