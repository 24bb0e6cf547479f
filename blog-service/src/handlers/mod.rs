//! HTTP handlers for blog-service.

pub mod comments;
pub mod posts;
pub mod profiles;
pub mod taxonomy;
