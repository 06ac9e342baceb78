use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
        jwt::JwtKeys,
        oauth::GoogleOAuth,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google", get(google))
        .route("/auth/google/callback", get(google_callback))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// The token travels back to the SPA as a query parameter; the callback
/// page reads it out of the URL. Known trade-off: the token lands in
/// browser history.
pub(crate) fn success_redirect(client_url: &str, token: &str) -> String {
    format!("{client_url}?token={}", urlencoding::encode(token))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if payload.username.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "username, email and password are required".into(),
        ));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("invalid email".into()));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::Validation(
            "password must be at least 6 characters".into(),
        ));
    }

    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::DuplicateCredential("Email already registered".into()));
    }
    if User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        warn!(username = %payload.username, "username already taken");
        return Err(ApiError::DuplicateCredential("Username already taken".into()));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;
    let user = User::create(&state.db, &payload.username, &payload.email, &hash)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::InvalidCredential("Invalid email and password combination".into())
        })?;

    // accounts created through Google have no password to check against
    let Some(hash) = user.password_hash.as_deref() else {
        warn!(user_id = user.id, "password login against provider-only account");
        return Err(ApiError::InvalidCredential(
            "This account was registered through Google. Please sign in with Google.".into(),
        ));
    };

    let ok = verify_password(&payload.password, hash).map_err(ApiError::Internal)?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredential(
            "Invalid email and password combination".into(),
        ));
    }

    let token = JwtKeys::from_ref(&state)
        .issue(&user)
        .map_err(ApiError::Internal)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(TokenResponse { token }))
}

/// Kick off the Google flow: redirect the browser to the consent page.
#[instrument(skip(state))]
pub async fn google(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let google = state.config.google.as_ref().ok_or(ApiError::OAuthNotConfigured)?;
    let service = GoogleOAuth::new(google);
    // TODO: persist the state parameter and check it in the callback
    let url = service.authorization_url(&random_state());
    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    #[allow(dead_code)]
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Provider callback. Successful sign-ins bounce to the client callback
/// page with the token in the query string; denials bounce to the login
/// page with nothing. Only server-side faults surface as JSON errors.
#[instrument(skip(state, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
) -> Result<Redirect, ApiError> {
    match complete_google_sign_in(&state, &query).await {
        Ok(token) => Ok(Redirect::temporary(&success_redirect(
            &state.config.client_success_url,
            &token,
        ))),
        Err(ApiError::ExternalAuthDenied) => {
            Ok(Redirect::temporary(&state.config.client_failure_url))
        }
        Err(e) => Err(e),
    }
}

async fn complete_google_sign_in(
    state: &AppState,
    query: &GoogleCallbackQuery,
) -> Result<String, ApiError> {
    let google = state.config.google.as_ref().ok_or(ApiError::OAuthNotConfigured)?;

    if let Some(reason) = &query.error {
        warn!(%reason, "external authentication denied");
        return Err(ApiError::ExternalAuthDenied);
    }
    let code = query.code.as_deref().ok_or_else(|| {
        warn!("callback without authorization code");
        ApiError::ExternalAuthDenied
    })?;

    let profile = GoogleOAuth::new(google)
        .exchange_code(code)
        .await
        .map_err(|e| {
            warn!(error = %e, "code exchange failed");
            ApiError::ExternalAuthDenied
        })?;

    let user = User::find_or_create_from_google(&state.db, &profile)
        .await
        .map_err(ApiError::Internal)?;
    let token = JwtKeys::from_ref(state)
        .issue(&user)
        .map_err(ApiError::Internal)?;

    info!(user_id = user.id, "google sign-in completed");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("alice@x.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@at.com"));
        assert!(!is_valid_email("spaces in@x.com"));
    }

    #[test]
    fn random_state_is_url_safe() {
        let state = random_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(state, random_state());
    }

    // The handoff is deliberately a query parameter, not a cookie: the SPA's
    // callback page reads `?token=`.
    #[test]
    fn oauth_handoff_puts_token_in_query_string() {
        let url = success_redirect("http://localhost:5173/auth/callback", "abc.def.ghi");
        assert_eq!(url, "http://localhost:5173/auth/callback?token=abc.def.ghi");
    }

    #[test]
    fn oauth_handoff_encodes_token() {
        let url = success_redirect("http://localhost:5173/auth/callback", "a+b/c=");
        assert_eq!(url, "http://localhost:5173/auth/callback?token=a%2Bb%2Fc%3D");
    }
}
