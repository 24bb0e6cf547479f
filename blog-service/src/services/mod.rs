//! Service modules for blog-service.

pub mod comment_tree;
pub mod database;
pub mod metrics;
pub mod slug;

pub use comment_tree::{build_forest, CommentNode};
pub use database::Database;
