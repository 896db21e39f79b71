use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::auth::token::TokenError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Token is missing")]
    MissingToken,

    /// Bad signature, undecodable payload, expiry and unknown subject all land here.
    #[error("Token is invalid")]
    InvalidToken,

    #[error("Could not verify")]
    CouldNotVerify,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Pool(e) => AppError::Pool(e),
            StoreError::Sql(e) => AppError::Database(e),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::InvalidToken
    }
}

fn internal(label: &str, err: &dyn std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("{}: {}", label, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MissingToken => (StatusCode::UNAUTHORIZED, "Token is missing".to_string()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token is invalid".to_string()),
            AppError::CouldNotVerify => {
                return (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Basic realm=\"Login required\"")],
                    "Could not verify",
                )
                    .into_response();
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Database(e) => internal("Database error", e),
            AppError::Pool(e) => internal("Pool error", e),
            AppError::Signing(e) => internal("Token signing error", e),
            AppError::Internal(msg) => internal("Internal error", msg),
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
