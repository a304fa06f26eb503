use std::sync::Arc;

use corrode_atoms::media::{PROCESSED_AREA, UPLOADS_AREA};
use corrode_shared::AppState;
use inspection_block::{
    add_comment_handler, dashboard_handler, detect_image_handler, history_handler,
    list_comments_handler, list_detections_handler, serve_file_handler, upload_image_handler,
};
use lambda_http::http::header::HeaderValue;
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    resp
}

/// Main Lambda handler - routes requests to the inspection handlers
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    tracing::info!("🚀 Corrosion API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        (&Method::POST, ["upload"]) => {
            let params = event.query_string_parameters();
            upload_image_handler(&state.store, &state.workspace, params.first("filename"), body).await
        }
        (&Method::POST, ["detect"]) => {
            detect_image_handler(
                &state.store,
                &state.detector,
                &state.workspace,
                state.config.inference_timeout,
                body,
            )
            .await
        }
        (&Method::POST, ["comment"]) => add_comment_handler(&state.store, body).await,
        (&Method::GET, ["history"]) => history_handler(&state.store).await,
        (&Method::GET, ["dashboard"]) => dashboard_handler(&state.store).await,
        (&Method::GET, ["images", image_id, "comments"]) => {
            list_comments_handler(&state.store, image_id).await
        }
        (&Method::GET, ["images", image_id, "detections"]) => {
            list_detections_handler(&state.store, image_id).await
        }
        (&Method::GET, ["uploads", name]) => {
            serve_file_handler(&state.store, &state.workspace.upload_dir, UPLOADS_AREA, name).await
        }
        (&Method::GET, ["processed", name]) => {
            serve_file_handler(&state.store, &state.workspace.processed_dir, PROCESSED_AREA, name).await
        }
        (_, route) if is_known_route(route) => method_not_allowed(),
        _ => not_found(),
    };

    resp.map(with_cors_headers)
}

fn is_known_route(parts: &[&str]) -> bool {
    matches!(
        parts,
        ["upload"]
            | ["detect"]
            | ["comment"]
            | ["history"]
            | ["dashboard"]
            | ["images", _, "comments" | "detections"]
            | ["uploads", _]
            | ["processed", _]
    )
}

fn method_not_allowed() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Method not allowed"}).to_string().into())
        .map_err(Box::new)?)
}

fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}
