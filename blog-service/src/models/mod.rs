//! Domain models for blog-service.

pub mod category;
pub mod comment;
pub mod post;
pub mod profile;
pub mod tag;

pub use category::{Category, CreateCategory};
pub use comment::{Comment, CreateComment};
pub use post::{CreatePost, ListPostsFilter, Post, PostStatus, UpdatePost};
pub use profile::{AuthorProfile, UpdateAuthorProfile};
pub use tag::Tag;
