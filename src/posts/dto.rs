use serde::{Deserialize, Serialize};

use crate::posts::repo::FeedPost;

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    10
}

/// Page-numbered query parameters, `?page=2&limit=10`.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit
    }
}

#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl PageInfo {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<FeedPost>,
    pub pagination: PageInfo,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub message: String,
    pub post: FeedPost,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub message: String,
    pub liked: bool,
    pub like_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn pagination_offset() {
        let p = Pagination { page: 3, limit: 20 };
        assert_eq!(p.offset(), 40);
        // pages below 1 clamp to the first page
        let p = Pagination { page: 0, limit: 20 };
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn page_info_rounds_up() {
        assert_eq!(PageInfo::new(1, 10, 0).pages, 0);
        assert_eq!(PageInfo::new(1, 10, 10).pages, 1);
        assert_eq!(PageInfo::new(1, 10, 11).pages, 2);
    }
}
