use corrode_atoms::artifact::{self, Workspace};
use corrode_atoms::media::{
    archive_key, secure_filename, unique_filename, upload_url, UploadedImage, UPLOADS_AREA,
};
use corrode_atoms::store::Store;
use corrode_atoms::{CoreError, CoreResult};
use lambda_http::{http::StatusCode, Body, Error, Response};
use tracing::{info, warn};
use uuid::Uuid;

use crate::respond;

/// Save an uploaded image under a unique name and record it.
///
/// A store that cannot be reached does not fail the upload: the caller gets
/// a locally generated id instead.
pub async fn upload_image<S: Store>(
    store: &S,
    workspace: &Workspace,
    filename: Option<&str>,
    body: &[u8],
) -> CoreResult<UploadedImage> {
    let requested = filename
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CoreError::InvalidInput("No selected file".into()))?;

    if body.is_empty() {
        return Err(CoreError::InvalidInput("No file part".into()));
    }
    if body.len() > workspace.max_upload_bytes {
        return Err(CoreError::TooLarge {
            size: body.len(),
            limit: workspace.max_upload_bytes,
        });
    }

    let safe = secure_filename(requested)
        .ok_or_else(|| CoreError::InvalidInput(format!("Unusable file name: {}", requested)))?;
    let stored_name = unique_filename(&safe);
    let path = workspace.upload_path(&stored_name);
    artifact::write_bytes(&path, body)?;

    let original_url = upload_url(&stored_name);
    let image_id = match store.insert_image(&stored_name, &original_url).await {
        Ok(image) => image.id,
        Err(e) if e.is_remote() => {
            let fallback = Uuid::new_v4().to_string();
            warn!("insert_image failed, using local id {}: {}", fallback, e);
            fallback
        }
        Err(e) => return Err(e),
    };

    if let Err(e) = store
        .archive_artifact(&path, &archive_key(UPLOADS_AREA, &stored_name))
        .await
    {
        warn!("Could not archive upload {}: {}", stored_name, e);
    }

    Ok(UploadedImage {
        image_id,
        original_url,
        filename: stored_name,
    })
}

/// HANDLER: POST /upload?filename=NAME with the raw image as the body.
pub async fn upload_image_handler<S: Store>(
    store: &S,
    workspace: &Workspace,
    filename: Option<&str>,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    info!(
        "📥 upload_image_handler: filename={:?}, bytes={}",
        filename,
        body.len()
    );

    match upload_image(store, workspace, filename, body).await {
        Ok(uploaded) => {
            info!(
                "✅ upload_image_handler success: image_id={}, filename={}",
                uploaded.image_id, uploaded.filename
            );
            respond::json(StatusCode::OK, &uploaded)
        }
        Err(e) => {
            tracing::error!("❌ upload_image_handler failed: filename={:?}, error={}", filename, e);
            respond::failure(&e)
        }
    }
}
