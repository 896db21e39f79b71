use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::db::models::{LikeEvent, LikeView};
use crate::db::{format_timestamp, timestamp_column};
use crate::state::DbPool;

use super::StoreError;

#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn find(&self, user_id: &str, post_id: &str) -> Result<Option<LikeEvent>, StoreError>;

    /// Insert a like. Returns false when the (user, post) pair already has one.
    async fn create(&self, like: &LikeEvent) -> Result<bool, StoreError>;

    /// Remove the like matching the event's (user, post) pair.
    async fn delete(&self, like: &LikeEvent) -> Result<bool, StoreError>;

    /// Timestamps of likes in `[from, to_exclusive)`, ascending.
    async fn timestamps_between(
        &self,
        from: DateTime<Utc>,
        to_exclusive: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, StoreError>;

    async fn list(&self) -> Result<Vec<LikeView>, StoreError>;

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<LikeView>, StoreError>;
}

pub struct SqliteLikeStore {
    pool: DbPool,
}

impl SqliteLikeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn query_views(
        &self,
        filter: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<LikeView>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT l.post_id, p.content, u.username, l.created_at FROM likes l \
             JOIN posts p ON p.id = l.post_id \
             JOIN users u ON u.id = l.user_id \
             {filter} ORDER BY l.created_at"
        ))?;
        let likes = stmt
            .query_map(args, |row| {
                Ok(LikeView {
                    post_id: row.get(0)?,
                    post: row.get(1)?,
                    liked_by: row.get(2)?,
                    put_on: timestamp_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(likes)
    }
}

#[async_trait]
impl LikeStore for SqliteLikeStore {
    async fn find(&self, user_id: &str, post_id: &str) -> Result<Option<LikeEvent>, StoreError> {
        let conn = self.pool.get()?;
        let like = conn
            .query_row(
                "SELECT id, user_id, post_id, created_at FROM likes \
                 WHERE user_id = ?1 AND post_id = ?2",
                params![user_id, post_id],
                |row| {
                    Ok(LikeEvent {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        post_id: row.get(2)?,
                        created_at: timestamp_column(row, 3)?,
                    })
                },
            )
            .optional()?;
        Ok(like)
    }

    async fn create(&self, like: &LikeEvent) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        // The UNIQUE(user_id, post_id) constraint settles concurrent double-likes
        let rows = conn.execute(
            "INSERT INTO likes (id, user_id, post_id, created_at) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(user_id, post_id) DO NOTHING",
            params![
                like.id,
                like.user_id,
                like.post_id,
                format_timestamp(like.created_at)
            ],
        )?;
        Ok(rows > 0)
    }

    async fn delete(&self, like: &LikeEvent) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
            params![like.user_id, like.post_id],
        )?;
        Ok(rows > 0)
    }

    async fn timestamps_between(
        &self,
        from: DateTime<Utc>,
        to_exclusive: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT created_at FROM likes \
             WHERE created_at >= ?1 AND created_at < ?2 \
             ORDER BY created_at",
        )?;
        let stamps = stmt
            .query_map(
                params![format_timestamp(from), format_timestamp(to_exclusive)],
                |row| timestamp_column(row, 0),
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stamps)
    }

    async fn list(&self) -> Result<Vec<LikeView>, StoreError> {
        self.query_views("", &[])
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<LikeView>, StoreError> {
        self.query_views("WHERE l.user_id = ?1", &[&user_id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Identity;
    use crate::store::identity::{IdentityStore, SqliteIdentityStore};
    use crate::store::posts::{PostStore, SqlitePostStore};
    use crate::store::test_support::{identity, post, test_pool};
    use chrono::TimeZone;

    struct Fixture {
        likes: SqliteLikeStore,
        alice: Identity,
        post_id: String,
        _temp: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let (pool, temp) = test_pool();
        let users = SqliteIdentityStore::new(pool.clone());
        let posts = SqlitePostStore::new(pool.clone());

        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let alice = identity("alice", at);
        users.create(&alice).await.unwrap();
        let p = post(&alice.id, "a post worth liking", at);
        posts.create(&p).await.unwrap();

        Fixture {
            likes: SqliteLikeStore::new(pool),
            alice,
            post_id: p.id,
            _temp: temp,
        }
    }

    fn like_at(user_id: &str, post_id: &str, at: DateTime<Utc>) -> LikeEvent {
        LikeEvent {
            created_at: at,
            ..LikeEvent::new(user_id, post_id)
        }
    }

    #[tokio::test]
    async fn test_create_find_delete() {
        let f = fixture().await;
        let like = LikeEvent::new(&f.alice.id, &f.post_id);

        assert!(f.likes.create(&like).await.unwrap());
        let found = f.likes.find(&f.alice.id, &f.post_id).await.unwrap();
        assert_eq!(found.map(|l| l.id), Some(like.id.clone()));

        assert!(f.likes.delete(&like).await.unwrap());
        assert_eq!(f.likes.find(&f.alice.id, &f.post_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_second_like_for_same_pair_is_ignored() {
        let f = fixture().await;

        assert!(f
            .likes
            .create(&LikeEvent::new(&f.alice.id, &f.post_id))
            .await
            .unwrap());
        assert!(!f
            .likes
            .create(&LikeEvent::new(&f.alice.id, &f.post_id))
            .await
            .unwrap());

        assert_eq!(f.likes.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_like_is_noop() {
        let f = fixture().await;
        let ghost = LikeEvent::new(&f.alice.id, &f.post_id);
        assert!(!f.likes.delete(&ghost).await.unwrap());
    }

    #[tokio::test]
    async fn test_timestamps_between_is_half_open() {
        let (pool, _temp) = test_pool();
        let users = SqliteIdentityStore::new(pool.clone());
        let posts = SqlitePostStore::new(pool.clone());
        let likes = SqliteLikeStore::new(pool);

        let day = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let author = identity("author", day);
        users.create(&author).await.unwrap();
        let p = post(&author.id, "popular", day);
        posts.create(&p).await.unwrap();

        let stamps = [
            day,
            Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        ];
        for (i, at) in stamps.iter().enumerate() {
            let fan = identity(&format!("fan{i}"), day);
            users.create(&fan).await.unwrap();
            likes.create(&like_at(&fan.id, &p.id, *at)).await.unwrap();
        }

        let found = likes
            .timestamps_between(day, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
            .await
            .unwrap();
        assert_eq!(found, stamps[..2].to_vec());
    }

    #[tokio::test]
    async fn test_list_by_user_joins_post_and_user() {
        let f = fixture().await;
        f.likes
            .create(&LikeEvent::new(&f.alice.id, &f.post_id))
            .await
            .unwrap();

        let mine = f.likes.list_by_user(&f.alice.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].post, "a post worth liking");
        assert_eq!(mine[0].liked_by, "alice");

        assert!(f.likes.list_by_user("someone-else").await.unwrap().is_empty());
    }
}
