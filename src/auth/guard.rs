use crate::error::ApiError;

/// Ownership check run before any post/comment mutation. The existence
/// check comes first: a non-owner probing a missing resource sees 404,
/// never 403.
pub fn ensure_owner(owner: Option<i64>, requester: i64, resource: &str) -> Result<(), ApiError> {
    match owner {
        None => Err(ApiError::ResourceNotFound(format!("{resource} not found"))),
        Some(id) if id != requester => Err(ApiError::NotOwner),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_resource_is_not_found_even_for_strangers() {
        let err = ensure_owner(None, 99, "Post").unwrap_err();
        assert!(matches!(err, ApiError::ResourceNotFound(_)));
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn mismatched_owner_is_forbidden() {
        let err = ensure_owner(Some(1), 2, "Post").unwrap_err();
        assert!(matches!(err, ApiError::NotOwner));
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn owner_passes() {
        assert!(ensure_owner(Some(7), 7, "Comment").is_ok());
    }
}
