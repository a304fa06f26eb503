pub mod model;
pub mod service;

pub use model::{Comment, CommentCreated, CreateCommentPayload};
