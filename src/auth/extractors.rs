use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    auth::{claims::Claims, jwt::JwtKeys, repo::User},
    error::ApiError,
    state::AppState,
};

/// Auth gate: extracts and validates the bearer token, handing the decoded
/// claims to the handler. Routes become protected by taking this argument.
#[derive(Debug)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::MissingCredential)?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::InvalidCredential("invalid authorization scheme".into()))?;

        // malformed, tampered and expired tokens all reject the same way
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::InvalidCredential("invalid or expired token".into())
        })?;

        if state.config.jwt.reverify {
            // re-verify mode: use the stored identity instead of trusting
            // the claim for the token's lifetime
            let user = User::find_by_id(&state.db, claims.sub)
                .await
                .map_err(ApiError::Internal)?
                .ok_or_else(|| ApiError::InvalidCredential("invalid or expired token".into()))?;
            return Ok(AuthUser(Claims {
                sub: user.id,
                username: user.username,
                avatar: user.profile_picture_url,
                ..claims
            }));
        }

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/posts");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn rejects_request_without_token() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingCredential));
    }

    #[tokio::test]
    async fn rejects_non_bearer_scheme() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Basic YWxpY2U6cHc="));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn rejects_garbage_token() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Bearer definitely-not-a-jwt"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn accepts_valid_token_and_exposes_claims() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user = User {
            id: 9,
            username: "alice".into(),
            email: Some("alice@x.com".into()),
            password_hash: Some("$argon2id$fake".into()),
            google_id: None,
            bio: String::new(),
            main_instrument: None,
            other_instruments: None,
            current_status: None,
            profile_picture_url: None,
            created_at: time::OffsetDateTime::now_utc(),
        };
        let token = keys.issue(&user).unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("valid token accepted");
        assert_eq!(claims.sub, 9);
        assert_eq!(claims.username, "alice");
    }
}
