use serde::{Deserialize, Serialize};

use crate::comments::repo::CommentWithAuthor;
use crate::posts::dto::PageInfo;

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}

/// Comment pages are larger than post pages by default.
#[derive(Debug, Deserialize)]
pub struct CommentPagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl CommentPagination {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentWithAuthor>,
    pub pagination: PageInfo,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub message: String,
    pub comment: CommentWithAuthor,
}
