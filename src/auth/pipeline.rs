//! Request interception for protected routes.
//!
//! A [`Pipeline`] is an authentication gate followed by an ordered
//! [`ObserverChain`]. The gate either resolves the caller's [`Identity`] or
//! rejects the request; observers then record side effects about the call
//! and can never reject it.
//!
//! Per request: `Received -> AuthChecking -> Rejected | AuthResolved ->
//! Observing(0..n) -> Handling -> Responded`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};

use crate::auth::credentials::CredentialStore;
use crate::auth::token::TokenService;
use crate::db::models::Identity;
use crate::error::{AppError, AppResult};

/// A side effect run for every request that got past authentication.
#[async_trait]
pub trait Observer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn observe(&self, identity: &Identity) -> AppResult<()>;
}

/// Observers run one after another, in insertion order.
#[derive(Clone, Default)]
pub struct ObserverChain {
    observers: Vec<Arc<dyn Observer>>,
}

impl ObserverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Run every observer. Failures are logged and skipped.
    pub async fn run(&self, identity: &Identity) {
        for (step, observer) in self.observers.iter().enumerate() {
            tracing::debug!(step, observer = observer.name(), "observing");
            if let Err(e) = observer.observe(identity).await {
                tracing::warn!(
                    observer = observer.name(),
                    user = %identity.username,
                    "observer failed: {}",
                    e
                );
            }
        }
    }
}

/// Authentication gate plus observers for one family of routes.
pub struct Pipeline {
    credentials: Arc<CredentialStore>,
    tokens: Arc<TokenService>,
    header: HeaderName,
    observers: ObserverChain,
}

impl Pipeline {
    pub fn new(
        credentials: Arc<CredentialStore>,
        tokens: Arc<TokenService>,
        header: HeaderName,
    ) -> Self {
        Self {
            credentials,
            tokens,
            header,
            observers: ObserverChain::new(),
        }
    }

    pub fn with_observers(mut self, observers: ObserverChain) -> Self {
        self.observers = observers;
        self
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Resolve the caller from the token header.
    ///
    /// An absent or empty header is `MissingToken`. Anything else that does
    /// not lead to an existing identity is `InvalidToken`.
    pub async fn authenticate(&self, headers: &HeaderMap) -> AppResult<Identity> {
        let raw = match headers.get(&self.header) {
            Some(value) if !value.is_empty() => value,
            _ => {
                tracing::debug!(header = %self.header, "rejected: token missing");
                return Err(AppError::MissingToken);
            }
        };

        let token = raw.to_str().map_err(|_| {
            tracing::debug!("rejected: token header is not visible ASCII");
            AppError::InvalidToken
        })?;

        let username = self.tokens.validate(token).map_err(|e| {
            tracing::debug!("rejected: {}", e);
            AppError::from(e)
        })?;

        match self.credentials.lookup(&username).await? {
            Some(identity) => {
                tracing::debug!(user = %identity.username, "auth resolved");
                Ok(identity)
            }
            None => {
                tracing::debug!(user = %username, "rejected: token subject does not exist");
                Err(AppError::InvalidToken)
            }
        }
    }

    /// Authenticate, then run the observers. The returned identity is what
    /// the handler sees.
    pub async fn admit(&self, headers: &HeaderMap) -> AppResult<Identity> {
        let identity = self.authenticate(headers).await?;
        self.observers.run(&identity).await;
        Ok(identity)
    }
}
