use sqlx::PgPool;

use crate::auth::repo::User;

/// Overwrite the profile fields of a user, returning the fresh row.
#[allow(clippy::too_many_arguments)]
pub async fn update_profile(
    db: &PgPool,
    id: i64,
    username: &str,
    bio: &str,
    main_instrument: Option<&str>,
    other_instruments: Option<&str>,
    current_status: Option<&str>,
    profile_picture_url: Option<&str>,
) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users \
         SET username = $2, bio = $3, main_instrument = $4, other_instruments = $5, \
             current_status = $6, profile_picture_url = $7 \
         WHERE id = $1 \
         RETURNING id, username, email, password_hash, google_id, bio, \
             main_instrument, other_instruments, current_status, profile_picture_url, created_at",
    )
    .bind(id)
    .bind(username)
    .bind(bio)
    .bind(main_instrument)
    .bind(other_instruments)
    .bind(current_status)
    .bind(profile_picture_url)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn set_password(db: &PgPool, id: i64, password_hash: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
    Ok(())
}
