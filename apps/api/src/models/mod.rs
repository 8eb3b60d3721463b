//! Database models for Loopcast

pub mod comment;
pub mod notification;
pub mod r#loop;
pub mod user;

pub use comment::{Comment, CommentWithAuthor};
pub use notification::{Notification, NotificationType};
pub use r#loop::{Loop, LoopStatus, LoopWithUploader};
pub use user::{PublicUser, User};

use serde::Serialize;

/// Paginated listing envelope
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_rounding() {
        assert_eq!(PageMeta::new(0, 1, 20).total_pages, 0);
        assert_eq!(PageMeta::new(20, 1, 20).total_pages, 1);
        assert_eq!(PageMeta::new(21, 1, 20).total_pages, 2);
    }
}
