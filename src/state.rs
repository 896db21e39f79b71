use std::sync::Arc;

use axum::http::HeaderName;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::{
    ActivityObserver, ActivityTracker, BcryptHasher, CredentialStore, LoginObserver,
    ObserverChain, PasswordHasher, Pipeline, TokenService,
};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::store::{
    IdentityStore, LikeStore, PostStore, SqliteIdentityStore, SqliteLikeStore, SqlitePostStore,
};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub identities: Arc<dyn IdentityStore>,
    pub posts: Arc<dyn PostStore>,
    pub likes: Arc<dyn LikeStore>,
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
    /// Run by the login handler once the password checks out.
    pub login_observers: ObserverChain,
    /// Token gate followed by activity stamping.
    pub protected: Arc<Pipeline>,
    /// Token gate alone, for reads that must not move `last_activity`.
    pub reporting: Arc<Pipeline>,
}

impl AppState {
    /// Wire stores, token service and pipelines. `config.auth.secret_key`
    /// must already be set.
    pub fn new(pool: DbPool, config: Config) -> AppResult<Self> {
        let identities: Arc<dyn IdentityStore> = Arc::new(SqliteIdentityStore::new(pool.clone()));
        let posts: Arc<dyn PostStore> = Arc::new(SqlitePostStore::new(pool.clone()));
        let likes: Arc<dyn LikeStore> = Arc::new(SqliteLikeStore::new(pool));

        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(config.auth.bcrypt_cost)?);
        let credentials = Arc::new(CredentialStore::new(identities.clone(), hasher));
        let tokens = Arc::new(TokenService::new(&config.auth)?);
        let tracker = Arc::new(ActivityTracker::new(identities.clone()));

        let header = HeaderName::from_bytes(config.auth.token_header.as_bytes()).map_err(|_| {
            AppError::Internal(format!(
                "invalid token header name: {:?}",
                config.auth.token_header
            ))
        })?;

        let gate = |observers: ObserverChain| {
            Arc::new(
                Pipeline::new(credentials.clone(), tokens.clone(), header.clone())
                    .with_observers(observers),
            )
        };
        let protected = gate(ObserverChain::new().with(Arc::new(ActivityObserver(tracker.clone()))));
        let reporting = gate(ObserverChain::new());
        let login_observers = ObserverChain::new().with(Arc::new(LoginObserver(tracker)));

        Ok(Self {
            config,
            identities,
            posts,
            likes,
            credentials,
            tokens,
            login_observers,
            protected,
            reporting,
        })
    }
}
