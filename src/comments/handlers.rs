use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
    auth::{extractors::AuthUser, guard::ensure_owner},
    comments::{
        dto::{
            CommentListResponse, CommentPagination, CommentResponse, CreateCommentRequest,
            UpdateCommentRequest,
        },
        repo::Comment,
    },
    error::ApiError,
    posts::{dto::PageInfo, repo::Post},
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/posts/:id/comments", get(list_comments).post(create_comment))
        .route("/comments/:id", put(update_comment).delete(delete_comment))
        .route("/comments/:id/like", post(toggle_like))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(p): Query<CommentPagination>,
) -> Result<Json<CommentListResponse>, ApiError> {
    let comments = Comment::list_for_post(&state.db, post_id, p.limit, p.offset())
        .await
        .map_err(ApiError::Internal)?;
    let total = Comment::count_for_post(&state.db, post_id)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(CommentListResponse {
        comments,
        pagination: PageInfo::new(p.page, p.limit, total),
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::Validation("Comment content is required".into()));
    }

    // the parent post must exist before anything is written
    if Post::owner_id(&state.db, post_id)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::ResourceNotFound("Post not found".into()));
    }

    let created = Comment::create(&state.db, post_id, claims.sub, payload.content.trim())
        .await
        .map_err(ApiError::Internal)?;
    let comment = Comment::get_with_author(&state.db, created.id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::ResourceNotFound("Comment not found".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            message: "Comment created successfully".into(),
            comment,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::Validation("Comment content is required".into()));
    }

    let owner = Comment::owner_id(&state.db, id).await.map_err(ApiError::Internal)?;
    ensure_owner(owner, claims.sub, "Comment")?;

    Comment::update(&state.db, id, payload.content.trim())
        .await
        .map_err(ApiError::Internal)?;
    let comment = Comment::get_with_author(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::ResourceNotFound("Comment not found".into()))?;

    Ok(Json(CommentResponse {
        message: "Comment updated successfully".into(),
        comment,
    }))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let owner = Comment::owner_id(&state.db, id).await.map_err(ApiError::Internal)?;
    ensure_owner(owner, claims.sub, "Comment")?;

    Comment::delete(&state.db, id).await.map_err(ApiError::Internal)?;
    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}

#[instrument(skip(state))]
pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if Comment::owner_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::ResourceNotFound("Comment not found".into()));
    }

    let liked = Comment::toggle_like(&state.db, claims.sub, id)
        .await
        .map_err(ApiError::Internal)?;
    let like_count = Comment::like_count(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(json!({
        "message": if liked { "Comment liked" } else { "Comment unliked" },
        "liked": liked,
        "like_count": like_count,
    })))
}
