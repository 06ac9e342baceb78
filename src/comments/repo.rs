use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Comment joined with its author, as rendered under a post.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub like_count: i64,
}

const COMMENT_SELECT: &str = "SELECT comments.id, comments.post_id, comments.user_id, \
     comments.content, comments.created_at, comments.updated_at, \
     users.username, users.profile_picture_url, \
     (SELECT COUNT(*) FROM likes WHERE likes.comment_id = comments.id) AS like_count \
     FROM comments JOIN users ON comments.user_id = users.id";

impl Comment {
    pub async fn list_for_post(
        db: &PgPool,
        post_id: i64,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<CommentWithAuthor>> {
        let rows = sqlx::query_as::<_, CommentWithAuthor>(&format!(
            "{COMMENT_SELECT} WHERE comments.post_id = $1 \
             ORDER BY comments.created_at ASC LIMIT $2 OFFSET $3"
        ))
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_for_post(db: &PgPool, post_id: i64) -> anyhow::Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(db)
            .await?;
        Ok(total)
    }

    pub async fn get_with_author(
        db: &PgPool,
        id: i64,
    ) -> anyhow::Result<Option<CommentWithAuthor>> {
        let row = sqlx::query_as::<_, CommentWithAuthor>(&format!(
            "{COMMENT_SELECT} WHERE comments.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn owner_id(db: &PgPool, id: i64) -> anyhow::Result<Option<i64>> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(owner)
    }

    pub async fn create(
        db: &PgPool,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> anyhow::Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (post_id, user_id, content) \
             VALUES ($1, $2, $3) \
             RETURNING id, post_id, user_id, content, created_at, updated_at",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(db)
        .await?;
        Ok(comment)
    }

    pub async fn update(db: &PgPool, id: i64, content: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE comments SET content = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(content)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn toggle_like(db: &PgPool, user_id: i64, comment_id: i64) -> anyhow::Result<bool> {
        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM likes WHERE user_id = $1 AND comment_id = $2",
        )
        .bind(user_id)
        .bind(comment_id)
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
                sqlx::query("INSERT INTO likes (user_id, comment_id) VALUES ($1, $2)")
                    .bind(user_id)
                    .bind(comment_id)
                    .execute(db)
                    .await?;
                Ok(true)
            }
        }
    }

    pub async fn like_count(db: &PgPool, comment_id: i64) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE comment_id = $1")
            .bind(comment_id)
            .fetch_one(db)
            .await?;
        Ok(count)
    }
}
