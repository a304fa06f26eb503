use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use corrode_atoms::artifact::Workspace;
use corrode_atoms::detections::{DetectRequest, DetectResponse};
use corrode_atoms::error::with_timeout;
use corrode_atoms::inference::{DetectionResult, Detector};
use corrode_atoms::media::{
    archive_key, is_secure_filename, processed_filename, processed_url, PROCESSED_AREA, UPLOADS_AREA,
};
use corrode_atoms::store::{require, Store};
use corrode_atoms::{CoreError, CoreResult};
use lambda_http::{http::StatusCode, Body, Error, Response};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::respond;

/// Detect, render and measure one image off the async runtime, bounded by
/// `limit`.
///
/// The artifact is rendered to a hidden staging file next to `destination`
/// and only moved into place when the whole job finished in time. A job
/// that outlives `limit` keeps running on the blocking pool; whichever side
/// sees the abandon flag last removes its staging file.
pub async fn run_detection<D>(
    detector: &Arc<D>,
    source: PathBuf,
    destination: PathBuf,
    limit: Duration,
) -> CoreResult<(DetectionResult, f64)>
where
    D: Detector + 'static,
{
    let staging = staging_path(&destination)?;
    let abandoned = Arc::new(AtomicBool::new(false));

    let job = {
        let detector = Arc::clone(detector);
        let staging = staging.clone();
        let abandoned = Arc::clone(&abandoned);
        tokio::task::spawn_blocking(move || -> CoreResult<(DetectionResult, f64)> {
            let result = detector.detect(&source)?;
            detector.render(&result, &staging)?;
            if abandoned.load(Ordering::SeqCst) {
                let _ = std::fs::remove_file(&staging);
                return Err(CoreError::Timeout(limit));
            }
            let percentage = detector.coverage(&result)?;
            Ok((result, percentage))
        })
    };

    let outcome = with_timeout(limit, async {
        job.await
            .map_err(|e| CoreError::Inference(format!("detection task failed: {}", e)))?
    })
    .await;

    match outcome {
        Ok(measured) => {
            tokio::fs::rename(&staging, &destination).await?;
            Ok(measured)
        }
        Err(e) => {
            abandoned.store(true, Ordering::SeqCst);
            if let Err(io) = tokio::fs::remove_file(&staging).await {
                debug!("no staged artifact to discard at {}: {}", staging.display(), io);
            }
            Err(e)
        }
    }
}

fn staging_path(destination: &Path) -> CoreResult<PathBuf> {
    let name = destination
        .file_name()
        .ok_or_else(|| CoreError::InvalidInput(format!("no file name in {}", destination.display())))?;
    // Extension stays last: render picks the output format from it.
    Ok(destination.with_file_name(format!(
        ".staging-{}-{}",
        Uuid::new_v4().simple(),
        name.to_string_lossy()
    )))
}

/// Run the detector on a previously uploaded image and record the outcome.
///
/// Store failures while recording are logged and skipped; the caller still
/// receives the measured coverage.
pub async fn detect_image<S, D>(
    store: &S,
    detector: &Arc<D>,
    workspace: &Workspace,
    inference_timeout: Duration,
    image_id: Option<&str>,
    filename: Option<&str>,
) -> CoreResult<DetectResponse>
where
    S: Store,
    D: Detector + 'static,
{
    let image_id = image_id.unwrap_or_default();
    let filename = filename.unwrap_or_default();
    if require("image_id", image_id).is_err() || require("filename", filename).is_err() {
        return Err(CoreError::InvalidInput("Missing parameters".into()));
    }

    if !is_secure_filename(filename) {
        return Err(CoreError::InvalidInput(format!("Invalid filename: {}", filename)));
    }

    let source = workspace.upload_path(filename);
    if !source.is_file() {
        return Err(CoreError::NotFound(format!("Image {} not found", filename)));
    }

    let output_name = processed_filename(filename);
    let destination = workspace.processed_path(&output_name);
    let (result, percentage) =
        run_detection(detector, source.clone(), destination.clone(), inference_timeout).await?;

    let summary = result.summarize(percentage);
    let processed = processed_url(&output_name);

    if let Err(e) = store.update_image_processed(image_id, &processed).await {
        warn!("update_image_processed failed for {}: {}", image_id, e);
    }
    if let Err(e) = store.insert_detection(image_id, percentage, &summary).await {
        warn!("insert_detection failed for {}: {}", image_id, e);
    }

    let archives = [
        (&source, archive_key(UPLOADS_AREA, filename)),
        (&destination, archive_key(PROCESSED_AREA, &output_name)),
    ];
    for (path, key) in &archives {
        if let Err(e) = store.archive_artifact(path, key).await {
            warn!("Could not archive {}: {}", key, e);
        }
    }

    Ok(DetectResponse {
        processed_url: processed,
        corrosion_percentage: percentage,
        detection_data: summary,
    })
}

/// HANDLER: POST /detect with `{image_id, filename}`.
pub async fn detect_image_handler<S, D>(
    store: &S,
    detector: &Arc<D>,
    workspace: &Workspace,
    inference_timeout: Duration,
    body: &[u8],
) -> Result<Response<Body>, Error>
where
    S: Store,
    D: Detector + 'static,
{
    info!("📥 detect_image_handler: raw_body={}", String::from_utf8_lossy(body));

    let outcome = match respond::parse_body::<DetectRequest>(body) {
        Ok(req) => {
            detect_image(
                store,
                detector,
                workspace,
                inference_timeout,
                req.image_id.as_deref(),
                req.filename.as_deref(),
            )
            .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(response) => {
            info!(
                "✅ detect_image_handler success: processed_url={}, corrosion={:.2}%, boxes={}",
                response.processed_url,
                response.corrosion_percentage,
                response.detection_data.boxes.len()
            );
            respond::json(StatusCode::OK, &response)
        }
        Err(e) => {
            tracing::error!("❌ detect_image_handler failed: error={}", e);
            respond::failure(&e)
        }
    }
}
