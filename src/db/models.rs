use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Last successful login.
    pub last_seen: DateTime<Utc>,
    /// Last authenticated request.
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// The two per-identity timestamps, each with exactly one writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    LastSeen,
    LastActivity,
}

impl TimestampField {
    pub fn column(self) -> &'static str {
        match self {
            TimestampField::LastSeen => "last_seen",
            TimestampField::LastActivity => "last_activity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One identity liking one post at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEvent {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

impl LikeEvent {
    pub fn new(user_id: impl Into<String>, post_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            post_id: post_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// A post joined with its author's username, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub content: String,
    pub author: String,
    pub posted_on: DateTime<Utc>,
}

/// A like joined with the liked post's content and the liker's username.
#[derive(Debug, Clone, Serialize)]
pub struct LikeView {
    pub post_id: String,
    pub post: String,
    pub liked_by: String,
    pub put_on: DateTime<Utc>,
}
