use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::models::{Identity, TimestampField};
use crate::db::{format_timestamp, timestamp_column};
use crate::state::DbPool;

use super::{is_constraint_violation, StoreError};

const IDENTITY_COLUMNS: &str =
    "id, username, email, password_hash, last_seen, last_activity, created_at";

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, StoreError>;

    /// Insert a new identity. A taken username or email is a `Conflict`.
    async fn create(&self, identity: &Identity) -> Result<(), StoreError>;

    /// Overwrite a single timestamp column. Returns false if no such identity.
    async fn update_timestamp(
        &self,
        id: &str,
        field: TimestampField,
        instant: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// All identities, oldest first.
    async fn list(&self) -> Result<Vec<Identity>, StoreError>;
}

pub struct SqliteIdentityStore {
    pool: DbPool,
}

impl SqliteIdentityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn identity_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Identity> {
    Ok(Identity {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        last_seen: timestamp_column(row, 4)?,
        last_activity: timestamp_column(row, 5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
        let conn = self.pool.get()?;
        let identity = conn
            .query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                identity_from_row,
            )
            .optional()?;
        Ok(identity)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        let conn = self.pool.get()?;
        let identity = conn
            .query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                identity_from_row,
            )
            .optional()?;
        Ok(identity)
    }

    async fn create(&self, identity: &Identity) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        let result = conn.execute(
            &format!("INSERT INTO users ({IDENTITY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                identity.id,
                identity.username,
                identity.email,
                identity.password_hash,
                format_timestamp(identity.last_seen),
                format_timestamp(identity.last_activity),
                format_timestamp(identity.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(StoreError::Conflict(
                "username or email already registered".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_timestamp(
        &self,
        id: &str,
        field: TimestampField,
        instant: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        // Column names come from a closed enum, never from input
        let rows = conn.execute(
            &format!("UPDATE users SET {} = ?1 WHERE id = ?2", field.column()),
            params![format_timestamp(instant), id],
        )?;
        Ok(rows > 0)
    }

    async fn list(&self) -> Result<Vec<Identity>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users ORDER BY created_at, username"
        ))?;
        let identities = stmt
            .query_map([], identity_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(identities)
    }
}
