use corrode_atoms::CoreError;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

pub fn error(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    json(status, &serde_json::json!({ "error": message }))
}

pub fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::InvalidInput(_) | CoreError::InvalidDimensions { .. } => StatusCode::BAD_REQUEST,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        CoreError::RemoteService(_) => StatusCode::BAD_GATEWAY,
        CoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        CoreError::ModelLoad(_) | CoreError::Inference(_) | CoreError::Io(_) | CoreError::Image(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Error body for a domain failure, with the status it maps to.
pub fn failure(err: &CoreError) -> Result<Response<Body>, Error> {
    error(status_for(err), &err.to_string())
}

/// Parse a JSON request body, reporting malformed input as a domain error.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, CoreError> {
    serde_json::from_slice(body).map_err(|e| CoreError::InvalidInput(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        assert_eq!(status_for(&CoreError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&CoreError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&CoreError::TooLarge { size: 2, limit: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(status_for(&CoreError::RemoteService("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&CoreError::Timeout(Duration::from_secs(1))),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn error_body_is_json() {
        let resp = error(StatusCode::BAD_REQUEST, "Missing parameters").unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "Missing parameters");
    }

    #[test]
    fn malformed_body_is_invalid_input() {
        let parsed: Result<serde_json::Value, _> = parse_body(b"{not json");
        assert!(matches!(parsed, Err(CoreError::InvalidInput(_))));
    }
}
