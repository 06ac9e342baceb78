use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::{
    auth::{extractors::AuthUser, guard::ensure_owner},
    error::ApiError,
    posts::{
        dto::{LikeResponse, PageInfo, Pagination, PostListResponse, PostResponse, UpdatePostRequest},
        repo::{FeedPost, Post},
    },
    state::AppState,
    storage::{is_allowed_media, MAX_UPLOAD_BYTES},
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/posts/:id/like", post(toggle_like))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<PostListResponse>, ApiError> {
    let posts = Post::list(&state.db, p.limit, p.offset())
        .await
        .map_err(ApiError::Internal)?;
    let total = Post::count(&state.db).await.map_err(ApiError::Internal)?;
    Ok(Json(PostListResponse {
        posts,
        pagination: PageInfo::new(p.page, p.limit, total),
    }))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FeedPost>, ApiError> {
    let post = Post::get(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::ResourceNotFound("Post not found".into()))?;
    Ok(Json(post))
}

/// POST /posts (multipart): `title`, `content`, optional `media` file.
#[instrument(skip(state, mp))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let mut title = String::new();
    let mut content = String::new();
    let mut media: Option<(String, String, Bytes)> = None;

    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("title") => {
                title = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
            }
            Some("content") => {
                content = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
            }
            Some("media") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                media = Some((file_name, content_type, data));
            }
            _ => {}
        }
    }

    if title.trim().is_empty() && content.trim().is_empty() && media.is_none() {
        return Err(ApiError::Validation(
            "A post needs a title, text or media".into(),
        ));
    }

    let media_url = match media {
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
        None => None,
    };

    let created = Post::create(&state.db, claims.sub, &title, &content, media_url.as_deref())
        .await
        .map_err(ApiError::Internal)?;
    let post = Post::get(&state.db, created.id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::ResourceNotFound("Post not found".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "Post created successfully".into(),
            post,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, ApiError> {
    let owner = Post::owner_id(&state.db, id).await.map_err(ApiError::Internal)?;
    ensure_owner(owner, claims.sub, "Post")?;

    Post::update(&state.db, id, payload.title.as_deref(), payload.content.as_deref())
        .await
        .map_err(ApiError::Internal)?;
    let post = Post::get(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::ResourceNotFound("Post not found".into()))?;

    Ok(Json(PostResponse {
        message: "Post updated successfully".into(),
        post,
    }))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let owner = Post::owner_id(&state.db, id).await.map_err(ApiError::Internal)?;
    ensure_owner(owner, claims.sub, "Post")?;

    let media_url = Post::delete(&state.db, id).await.map_err(ApiError::Internal)?;
    if let Some(url) = media_url {
        if let Err(e) = state.media.delete(&url).await {
            warn!(error = %e, %url, "failed to remove post media");
        }
    }

    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

#[instrument(skip(state))]
pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeResponse>, ApiError> {
    if Post::owner_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::ResourceNotFound("Post not found".into()));
    }

    let liked = Post::toggle_like(&state.db, claims.sub, id)
        .await
        .map_err(ApiError::Internal)?;
    let like_count = Post::like_count(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(LikeResponse {
        message: if liked { "Post liked" } else { "Post unliked" }.into(),
        liked,
        like_count,
    }))
}
