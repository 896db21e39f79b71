// Record stores - every database side effect lives behind these traits
pub mod identity;
pub mod likes;
pub mod posts;

use thiserror::Error;

pub use identity::{IdentityStore, SqliteIdentityStore};
pub use likes::{LikeStore, SqliteLikeStore};
pub use posts::{PostStore, SqlitePostStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// True when the error is a UNIQUE / FOREIGN KEY style constraint failure.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
