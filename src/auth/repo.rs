use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::auth::oauth::GoogleProfile;

/// User record in the database. `password_hash` and `google_id` are both
/// nullable, but the schema guarantees at least one is set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub google_id: Option<String>,
    pub bio: String,
    pub main_instrument: Option<String>,
    pub other_instruments: Option<String>,
    pub current_status: Option<String>,
    pub profile_picture_url: Option<String>,
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, google_id, bio, \
     main_instrument, other_instruments, current_status, profile_picture_url, created_at";

impl User {
    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a locally registered user with a hashed password.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_google_id(db: &PgPool, google_id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Reconcile a provider profile to a local account. Repeated callbacks
    /// with the same subject id reuse the first-created row.
    pub async fn find_or_create_from_google(
        db: &PgPool,
        profile: &GoogleProfile,
    ) -> anyhow::Result<User> {
        if let Some(user) = Self::find_by_google_id(db, &profile.id).await? {
            return Ok(user);
        }

        // no password hash: the account authenticates through Google only
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, google_id) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.id)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_user_hides_credentials() {
        let user = User {
            id: 1,
            username: "alice".into(),
            email: Some("alice@x.com".into()),
            password_hash: Some("$argon2id$secret".into()),
            google_id: Some("g-123".into()),
            bio: String::new(),
            main_instrument: Some("guitar".into()),
            other_instruments: None,
            current_status: None,
            profile_picture_url: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("google_id"));
        assert!(json.contains("alice"));
    }
}
