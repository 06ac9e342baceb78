use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, Path, State},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::PublicUser,
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    posts::repo::{FeedPost, Post},
    profile::{dto::ProfileUpdateResponse, repo},
    state::AppState,
    storage::{is_allowed_media, MAX_UPLOAD_BYTES},
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/me", get(get_me).put(update_me))
        .route("/profile/:id", get(get_profile))
        .route("/profile/:id/posts", get(get_user_posts))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::ResourceNotFound("Profile not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::ResourceNotFound("Profile not found".into()))?;
    Ok(Json(user.into()))
}

/// PUT /profile/me (multipart): text fields plus an optional
/// `profile_picture` file and an optional password change.
#[instrument(skip(state, mp))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    mut mp: Multipart,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let mut username: Option<String> = None;
    let mut bio: Option<String> = None;
    let mut main_instrument: Option<String> = None;
    let mut other_instruments: Option<String> = None;
    let mut current_status: Option<String> = None;
    let mut current_password: Option<String> = None;
    let mut new_password: Option<String> = None;
    let mut picture: Option<(String, String, Bytes)> = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("profile_picture") => {
                let file_name = field.file_name().unwrap_or("avatar").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                picture = Some((file_name, content_type, data));
            }
            Some(text_field) => {
                let text_field = text_field.to_string();
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                match text_field.as_str() {
                    "username" => username = Some(value),
                    "bio" => bio = Some(value),
                    "main_instrument" => main_instrument = Some(value),
                    "other_instruments" => other_instruments = Some(value),
                    "current_status" => current_status = Some(value),
                    "current_password" => current_password = Some(value),
                    "new_password" => new_password = Some(value),
                    _ => {}
                }
            }
            None => {}
        }
    }

    let current = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::ResourceNotFound("Profile not found".into()))?;

    let username = match username {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::Validation("Username cannot be empty".into()));
            }
            if name != current.username
                && User::find_by_username(&state.db, &name)
                    .await
                    .map_err(ApiError::Internal)?
                    .is_some()
            {
                warn!(username = %name, "username already exists");
                return Err(ApiError::Validation("Username already exists".into()));
            }
            name
        }
        None => current.username.clone(),
    };

    if let Some(new_password) = &new_password {
        let Some(hash) = current.password_hash.as_deref() else {
            return Err(ApiError::Validation(
                "Password sign-in is not enabled for this account".into(),
            ));
        };
        let supplied = current_password
            .as_deref()
            .ok_or_else(|| ApiError::Validation("Current password is required".into()))?;
        if !verify_password(supplied, hash).map_err(ApiError::Internal)? {
            return Err(ApiError::Validation("Current password is incorrect".into()));
        }
        if new_password.len() < 6 {
            return Err(ApiError::Validation(
                "New password must be at least 6 characters".into(),
            ));
        }
        let new_hash = hash_password(new_password).map_err(ApiError::Internal)?;
        repo::set_password(&state.db, current.id, &new_hash)
            .await
            .map_err(ApiError::Internal)?;
    }

    let profile_picture_url = match picture {
        Some((file_name, content_type, data)) => {
            if !is_allowed_media(&content_type) {
                return Err(ApiError::Validation(
                    "Only image and video uploads are allowed".into(),
                ));
            }
            Some(
                state
                    .media
                    .save(&file_name, &content_type, data)
                    .await
                    .map_err(ApiError::Internal)?,
            )
        }
        None => current.profile_picture_url.clone(),
    };

    // absent fields keep their stored values; empty instrument/status clear
    let bio = bio.unwrap_or_else(|| current.bio.clone());
    let main_instrument = resolve(main_instrument, &current.main_instrument);
    let other_instruments = resolve(other_instruments, &current.other_instruments);
    let current_status = resolve(current_status, &current.current_status);

    let updated = repo::update_profile(
        &state.db,
        current.id,
        &username,
        &bio,
        main_instrument.as_deref(),
        other_instruments.as_deref(),
        current_status.as_deref(),
        profile_picture_url.as_deref(),
    )
    .await
    .map_err(ApiError::Internal)?;

    // claims embed username and avatar, so hand back a fresh token
    let token = JwtKeys::from_ref(&state)
        .issue(&updated)
        .map_err(ApiError::Internal)?;

    info!(user_id = updated.id, "profile updated");
    Ok(Json(ProfileUpdateResponse {
        user: updated.into(),
        token,
    }))
}

fn resolve(provided: Option<String>, stored: &Option<String>) -> Option<String> {
    match provided {
        Some(value) => {
            let value = value.trim().to_string();
            if value.is_empty() {
                None
            } else {
                Some(value)
            }
        }
        None => stored.clone(),
    }
}

#[instrument(skip(state))]
pub async fn get_user_posts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<FeedPost>>, ApiError> {
    let posts = Post::list_by_user(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(posts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_keeps_stored_when_absent() {
        assert_eq!(
            resolve(None, &Some("guitar".into())),
            Some("guitar".to_string())
        );
    }

    #[test]
    fn resolve_overwrites_when_provided() {
        assert_eq!(
            resolve(Some("bass".into()), &Some("guitar".into())),
            Some("bass".to_string())
        );
    }

    #[test]
    fn resolve_clears_on_empty() {
        assert_eq!(resolve(Some("  ".into()), &Some("guitar".into())), None);
    }
}
