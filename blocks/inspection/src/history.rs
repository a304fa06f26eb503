use corrode_atoms::dashboard::{self, DashboardSummary};
use corrode_atoms::store::Store;
use corrode_atoms::CoreResult;
use futures::future::try_join_all;
use lambda_http::{http::StatusCode, Body, Error, Response};
use tracing::info;

use crate::respond;

/// HANDLER: GET /history, newest upload first.
pub async fn history_handler<S: Store>(store: &S) -> Result<Response<Body>, Error> {
    match store.get_all_images().await {
        Ok(images) => {
            info!("✅ history_handler: {} images", images.len());
            respond::json(StatusCode::OK, &images)
        }
        Err(e) => {
            tracing::error!("❌ history_handler failed: error={}", e);
            respond::failure(&e)
        }
    }
}

/// HANDLER: GET /images/{image_id}/detections
pub async fn list_detections_handler<S: Store>(store: &S, image_id: &str) -> Result<Response<Body>, Error> {
    match store.get_image_detections(image_id).await {
        Ok(detections) => {
            info!("✅ list_detections_handler: image_id={}, count={}", image_id, detections.len());
            respond::json(StatusCode::OK, &detections)
        }
        Err(e) => {
            tracing::error!("❌ list_detections_handler failed: image_id={}, error={}", image_id, e);
            respond::failure(&e)
        }
    }
}

/// Load every image with its detections and aggregate them.
pub async fn build_dashboard<S: Store>(store: &S) -> CoreResult<DashboardSummary> {
    let images = store.get_all_images().await?;
    let per_image = try_join_all(images.iter().map(|image| store.get_image_detections(&image.id))).await?;
    let detections: Vec<_> = per_image.into_iter().flatten().collect();

    Ok(dashboard::summarize(&images, &detections))
}

/// HANDLER: GET /dashboard
pub async fn dashboard_handler<S: Store>(store: &S) -> Result<Response<Body>, Error> {
    match build_dashboard(store).await {
        Ok(summary) => {
            info!(
                "✅ dashboard_handler: analyzed={}, average={:.2}%",
                summary.total_detections, summary.average_corrosion
            );
            respond::json(StatusCode::OK, &summary)
        }
        Err(e) => {
            tracing::error!("❌ dashboard_handler failed: error={}", e);
            respond::failure(&e)
        }
    }
}
