use std::path::Path;

use corrode_atoms::media::{archive_key, content_type_for, is_secure_filename};
use corrode_atoms::store::Store;
use lambda_http::{http::StatusCode, Body, Error, Response};
use tracing::{info, warn};

use crate::respond;

/// HANDLER: GET /uploads/{name} and /processed/{name}.
///
/// Serves the local copy from `dir` when there is one, otherwise redirects
/// to the artifact archived under `area` if the store can sign a URL for it.
pub async fn serve_file_handler<S: Store>(
    store: &S,
    dir: &Path,
    area: &str,
    name: &str,
) -> Result<Response<Body>, Error> {
    if !is_secure_filename(name) {
        return respond::error(StatusCode::NOT_FOUND, "File not found");
    }

    let path = dir.join(name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            info!("📤 serve_file_handler: {} ({} bytes)", path.display(), bytes.len());
            return Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", content_type_for(name))
                .header("Access-Control-Allow-Origin", "*")
                .body(Body::Binary(bytes))
                .map_err(Box::new)?);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::error!("❌ serve_file_handler failed: {}: {}", path.display(), e);
            return respond::error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    }

    match store.artifact_url(&archive_key(area, name)).await {
        Ok(Some(url)) => {
            info!("↪️ serve_file_handler: {} redirected to archive", name);
            Ok(Response::builder()
                .status(StatusCode::FOUND)
                .header("Location", url)
                .header("Access-Control-Allow-Origin", "*")
                .body(Body::Empty)
                .map_err(Box::new)?)
        }
        Ok(None) => respond::error(StatusCode::NOT_FOUND, "File not found"),
        Err(e) => {
            warn!("artifact_url failed for {}: {}", name, e);
            respond::error(StatusCode::NOT_FOUND, "File not found")
        }
    }
}
