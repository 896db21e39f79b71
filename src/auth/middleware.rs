use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::pipeline::Pipeline;
use crate::error::AppError;
use crate::extractors::CurrentUser;

/// Middleware that runs a [`Pipeline`] in front of the wrapped routes.
///
/// On success the resolved identity is stored in request extensions for the
/// [`CurrentUser`] extractor. On rejection the handler never runs.
pub async fn require_token(
    State(pipeline): State<Arc<Pipeline>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = pipeline.admit(req.headers()).await?;

    req.extensions_mut().insert(CurrentUser(identity));

    tracing::debug!("handling");
    let response = next.run(req).await;
    tracing::debug!(status = %response.status(), "responded");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::{BcryptHasher, CredentialStore, PasswordHasher};
    use crate::auth::token::TokenService;
    use crate::store::test_support::{identity, test_pool};
    use crate::store::{IdentityStore, SqliteIdentityStore};
    use axum::body::Body;
    use axum::http::{HeaderName, StatusCode};
    use axum::routing::get;
    use axum::{middleware, Router};
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    async fn guarded_app(hits: Arc<AtomicUsize>) -> (Router, String, tempfile::TempDir) {
        let (pool, temp) = test_pool();
        let identities: Arc<dyn IdentityStore> = Arc::new(SqliteIdentityStore::new(pool));
        let alice = identity("alice", Utc::now());
        identities.create(&alice).await.unwrap();

        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(4).unwrap());
        let tokens = Arc::new(TokenService::from_secret(b"k", Duration::minutes(120)));
        let token = tokens.issue(&alice, Duration::minutes(5)).unwrap();
        let pipeline = Arc::new(Pipeline::new(
            Arc::new(CredentialStore::new(identities, hasher)),
            tokens,
            HeaderName::from_static("x-access-token"),
        ));

        let app = Router::new()
            .route(
                "/guarded",
                get(move |CurrentUser(user): CurrentUser| {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        user.username
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(pipeline, require_token));
        (app, token, temp)
    }

    #[tokio::test]
    async fn handler_never_runs_without_token() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (app, _token, _temp) = guarded_app(hits.clone()).await;

        let response = app
            .oneshot(axum::http::Request::builder().uri("/guarded").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_identity() {
        let hits = Arc::new(AtomicUsize::new(0));
        let (app, token, _temp) = guarded_app(hits.clone()).await;

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/guarded")
                    .header("x-access-token", token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"alice");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
