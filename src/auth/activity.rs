use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::auth::pipeline::Observer;
use crate::db::models::{Identity, TimestampField};
use crate::error::AppResult;
use crate::store::IdentityStore;

/// Writes the per-identity `last_seen` / `last_activity` stamps.
pub struct ActivityTracker {
    identities: Arc<dyn IdentityStore>,
}

impl ActivityTracker {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    /// Stamp `last_activity` with the current instant.
    pub async fn mark_activity(&self, identity: &Identity) -> AppResult<()> {
        self.stamp(identity, TimestampField::LastActivity).await
    }

    /// Stamp `last_seen` with the current instant.
    pub async fn mark_login(&self, identity: &Identity) -> AppResult<()> {
        self.stamp(identity, TimestampField::LastSeen).await
    }

    async fn stamp(&self, identity: &Identity, field: TimestampField) -> AppResult<()> {
        let updated = self
            .identities
            .update_timestamp(&identity.id, field, Utc::now())
            .await?;
        if !updated {
            tracing::warn!(user = %identity.username, field = field.column(), "no row to stamp");
        }
        Ok(())
    }
}

/// Runs on protected routes.
pub struct ActivityObserver(pub Arc<ActivityTracker>);

#[async_trait]
impl Observer for ActivityObserver {
    fn name(&self) -> &'static str {
        "activity"
    }

    async fn observe(&self, identity: &Identity) -> AppResult<()> {
        self.0.mark_activity(identity).await
    }
}

/// Runs on the login route after the password check.
pub struct LoginObserver(pub Arc<ActivityTracker>);

#[async_trait]
impl Observer for LoginObserver {
    fn name(&self) -> &'static str {
        "login"
    }

    async fn observe(&self, identity: &Identity) -> AppResult<()> {
        self.0.mark_login(identity).await
    }
}
