//! HTTP transport for the prediction service (axum).
//!
//! Handlers are thin: they move the request into `PredictionService::dispatch`
//! on tokio's blocking pool (training is CPU-bound and synchronous) and turn the
//! `(status, json)` pair back into a response.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::error::AppError;
use crate::serve::service::{error_response, PredictionService};

type SharedService = Arc<PredictionService>;

pub fn router(service: SharedService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Known paths with the wrong method are unknown routes too: 404, not 405.
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/buildings", get(buildings).fallback(not_found))
        .route("/predict", post(predict).fallback(not_found))
        .fallback(not_found)
        .layer(cors)
        .with_state(service)
}

/// Bind and serve until the process is stopped.
pub async fn serve(service: SharedService, host: &str, port: u16) -> Result<(), AppError> {
    let listener = bind(host, port).await?;
    serve_on(listener, service).await
}

/// `host` may be an IP address or a hostname such as `localhost`.
pub async fn bind(host: &str, port: u16) -> Result<tokio::net::TcpListener, AppError> {
    tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|e| AppError::io(format!("Failed to bind {host}:{port}: {e}")))
}

pub async fn serve_on(listener: tokio::net::TcpListener, service: SharedService) -> Result<(), AppError> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Prediction API listening on http://{addr}");
    }
    axum::serve(listener, router(service))
        .await
        .map_err(|e| AppError::io(format!("Server error: {e}")))
}

async fn health(State(service): State<SharedService>) -> Response {
    dispatch(service, Method::GET, "/health", None).await
}

async fn buildings(State(service): State<SharedService>) -> Response {
    dispatch(service, Method::GET, "/buildings", None).await
}

/// The body is parsed here rather than with the `Json` extractor so malformed
/// JSON gets the same `{"error": ...}` shape as every other 400.
async fn predict(State(service): State<SharedService>, body: Bytes) -> Response {
    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => dispatch(service, Method::POST, "/predict", Some(value)).await,
        Err(e) => reply(error_response(&AppError::validation(format!("Invalid JSON: {e}")))),
    }
}

async fn not_found() -> Response {
    reply((404, json!({ "error": "Not found" })))
}

async fn dispatch(service: SharedService, method: Method, path: &'static str, body: Option<Value>) -> Response {
    let outcome = tokio::task::spawn_blocking(move || {
        service.dispatch(method.as_str(), path, body.as_ref())
    })
    .await;
    match outcome {
        Ok(result) => reply(result),
        Err(e) => reply(error_response(&AppError::internal(format!("Request handler failed: {e}")))),
    }
}

fn reply((status, body): (u16, Value)) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serve::service::TargetBuilding;

    async fn spawn_server() -> String {
        let service = PredictionService::new(
            vec![TargetBuilding {
                name: "RPAC".to_string(),
                building_code: "79".to_string(),
            }],
            Box::new(|_: &str| Err(AppError::internal("no data"))),
        );
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_on(listener, Arc::new(service)));
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn binds_hostnames() {
        let listener = bind("localhost", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());

        let err = bind("no such host.invalid", 0).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[tokio::test]
    async fn known_routes_answer() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let res = client.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["service"], "energy-predict-api");

        let res = client.get(format!("{base}/buildings")).send().await.unwrap();
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["buildings"][0]["building_code"], "79");
    }

    #[tokio::test]
    async fn wrong_method_and_unknown_path_are_404() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let requests = [
            client.get(format!("{base}/predict")),
            client.post(format!("{base}/health")),
            client.delete(format!("{base}/buildings")),
            client.get(format!("{base}/nope")),
        ];
        for request in requests {
            let res = request.send().await.unwrap();
            assert_eq!(res.status(), 404, "{}", res.url());
            let body: Value = res.json().await.unwrap();
            assert_eq!(body, json!({ "error": "Not found" }));
        }
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let base = spawn_server().await;
        let res = reqwest::Client::new()
            .post(format!("{base}/predict"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON"));
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let base = spawn_server().await;
        let res = reqwest::Client::new()
            .get(format!("{base}/health"))
            .header("origin", "http://example.test")
            .send()
            .await
            .unwrap();
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
    }
}
