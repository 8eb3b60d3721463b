//! Repository layer: all database access in one place
//!
//! Each repository owns the queries for one table cluster, following the
//! repository pattern. Handlers never touch the pool directly.

pub mod comment;
pub mod download;
pub mod notification;
pub mod rating;
pub mod r#loop;
pub mod user;
pub mod utils;

pub use comment::CommentRepository;
pub use download::DownloadRepository;
pub use notification::NotificationRepository;
pub use r#loop::{LoopFilter, LoopRef, LoopRepository, NewLoop, SortField, SortOrder};
pub use rating::RatingRepository;
pub use user::UserRepository;
