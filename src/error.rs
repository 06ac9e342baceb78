use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error surface of the API. Everything a handler can fail with ends up
/// here and is rendered as `{"message": ...}` with the matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Registration conflict: email or username already taken.
    #[error("{0}")]
    DuplicateCredential(String),

    /// Bad login combination, or a token that is missing its signature,
    /// tampered with, or expired. All of these reject identically.
    #[error("{0}")]
    InvalidCredential(String),

    /// A protected route was called without any token.
    #[error("missing authorization header")]
    MissingCredential,

    /// The OAuth provider denied or cancelled authentication. Surfaced as
    /// a redirect by the callback handler, never as a JSON body.
    #[error("external authentication denied")]
    ExternalAuthDenied,

    #[error("{0}")]
    ResourceNotFound(String),

    /// Requester is not the owner of the resource being mutated.
    #[error("not authorized to modify this resource")]
    NotOwner,

    #[error("{0}")]
    Validation(String),

    #[error("Google sign-in is not configured")]
    OAuthNotConfigured,

    /// Anything unexpected, including database failures. Details are
    /// logged server-side and never returned to the client.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateCredential(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            ApiError::MissingCredential => StatusCode::UNAUTHORIZED,
            ApiError::ExternalAuthDenied => StatusCode::UNAUTHORIZED,
            ApiError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotOwner => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::OAuthNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::DuplicateCredential("taken".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidCredential("bad".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::MissingCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::ExternalAuthDenied.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::ResourceNotFound("post not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::NotOwner.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Validation("title required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::OAuthNotConfigured.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused on 5432"));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
