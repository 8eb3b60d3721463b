//! HTTP route handlers
//!
//! One router per module, each with its own state struct, merged by the
//! server bootstrap.

pub mod auth;
pub mod comments;
pub mod downloads;
pub mod health;
pub mod loops;
pub mod notifications;
pub mod ratings;

pub use auth::{auth_router, AuthState};
pub use comments::{comments_router, CommentsState};
pub use downloads::{downloads_router, DownloadsState};
pub use health::health_router;
pub use loops::{loops_router, LoopsState};
pub use notifications::{notifications_router, NotificationsState};
pub use ratings::{ratings_router, RatingsState};
