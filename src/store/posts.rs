use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::db::models::{Post, PostView};
use crate::db::{format_timestamp, timestamp_column};
use crate::state::DbPool;

use super::StoreError;

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: &Post) -> Result<(), StoreError>;

    async fn find(&self, id: &str) -> Result<Option<Post>, StoreError>;

    /// Every post with its author, oldest first.
    async fn list(&self) -> Result<Vec<PostView>, StoreError>;

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Post>, StoreError>;

    async fn count_by_user(&self, user_id: &str) -> Result<i64, StoreError>;
}

pub struct SqlitePostStore {
    pool: DbPool,
}

impl SqlitePostStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
    })
}

#[async_trait]
impl PostStore for SqlitePostStore {
    async fn create(&self, post: &Post) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                post.id,
                post.user_id,
                post.content,
                format_timestamp(post.created_at)
            ],
        )?;
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                "SELECT id, user_id, content, created_at FROM posts WHERE id = ?1",
                params![id],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    async fn list(&self) -> Result<Vec<PostView>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.content, u.username, p.created_at FROM posts p \
             JOIN users u ON u.id = p.user_id \
             ORDER BY p.created_at",
        )?;
        let posts = stmt
            .query_map([], |row| {
                Ok(PostView {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    author: row.get(2)?,
                    posted_on: timestamp_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Post>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, content, created_at FROM posts \
             WHERE user_id = ?1 ORDER BY created_at",
        )?;
        let posts = stmt
            .query_map(params![user_id], post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    async fn count_by_user(&self, user_id: &str) -> Result<i64, StoreError> {
        let conn = self.pool.get()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
