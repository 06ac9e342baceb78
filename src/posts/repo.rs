use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Post as served in the feed: joined with its author and annotated with
/// like and comment counts.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeedPost {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub media_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
}

const FEED_SELECT: &str = "SELECT posts.id, posts.user_id, posts.title, posts.content, \
     posts.media_url, posts.created_at, posts.updated_at, \
     users.username, users.profile_picture_url, \
     (SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.id) AS like_count, \
     (SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id) AS comment_count \
     FROM posts JOIN users ON posts.user_id = users.id";

impl Post {
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<FeedPost>> {
        let rows = sqlx::query_as::<_, FeedPost>(&format!(
            "{FEED_SELECT} ORDER BY posts.created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(db)
            .await?;
        Ok(total)
    }

    pub async fn get(db: &PgPool, id: i64) -> anyhow::Result<Option<FeedPost>> {
        let row = sqlx::query_as::<_, FeedPost>(&format!("{FEED_SELECT} WHERE posts.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    pub async fn list_by_user(db: &PgPool, user_id: i64) -> anyhow::Result<Vec<FeedPost>> {
        let rows = sqlx::query_as::<_, FeedPost>(&format!(
            "{FEED_SELECT} WHERE posts.user_id = $1 ORDER BY posts.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Owner id of the post, `None` when the post does not exist.
    pub async fn owner_id(db: &PgPool, id: i64) -> anyhow::Result<Option<i64>> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(owner)
    }

    pub async fn create(
        db: &PgPool,
        user_id: i64,
        title: &str,
        content: &str,
        media_url: Option<&str>,
    ) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            "INSERT INTO posts (user_id, title, content, media_url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, title, content, media_url, created_at, updated_at",
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(media_url)
        .fetch_one(db)
        .await?;
        Ok(post)
    }

    /// Update title/content; absent fields keep their stored values.
    pub async fn update(
        db: &PgPool,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE posts SET title = COALESCE($2, title), \
             content = COALESCE($3, content), updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Delete the post, returning its media URL (if any) for file cleanup.
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<Option<String>> {
        let media_url: Option<Option<String>> =
            sqlx::query_scalar("DELETE FROM posts WHERE id = $1 RETURNING media_url")
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(media_url.flatten())
    }

    /// Like toggle: delete the like row when present, insert it otherwise.
    /// Returns whether the post ends up liked by the user.
    pub async fn toggle_like(db: &PgPool, user_id: i64, post_id: i64) -> anyhow::Result<bool> {
        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM likes WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(db)
        .await?;

        match existing {
            Some(like_id) => {
                sqlx::query("DELETE FROM likes WHERE id = $1")
                    .bind(like_id)
                    .execute(db)
                    .await?;
                Ok(false)
            }
            None => {
                sqlx::query("INSERT INTO likes (user_id, post_id) VALUES ($1, $2)")
                    .bind(user_id)
                    .bind(post_id)
                    .execute(db)
                    .await?;
                Ok(true)
            }
        }
    }

    pub async fn like_count(db: &PgPool, post_id: i64) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(db)
            .await?;
        Ok(count)
    }
}
