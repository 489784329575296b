use crate::infra::AppState;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use concorso::backoffice::{authorize, backoffice_router, BackofficeContext, BackofficeError};
use concorso::intake::{intake_router, SubmissionPipeline, SubmissionStore};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

// Up to 21 photos of 3 MB each plus the signed documents.
const MAX_REQUEST_BYTES: usize = 80 * 1024 * 1024;

pub(crate) fn with_contest_routes<S>(
    pipeline: Arc<SubmissionPipeline<S>>,
    context: Arc<BackofficeContext>,
) -> axum::Router
where
    S: SubmissionStore + 'static,
{
    let files = axum::Router::new()
        .route(
            "/api/v1/backoffice/files/:fiscal_code/*path",
            axum::routing::get(file_endpoint),
        )
        .with_state(context.clone());

    intake_router(pipeline)
        .merge(backoffice_router(context))
        .merge(files)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Raw bytes of one stored file, with a guessed content type so the admin
/// UI can preview photos and documents inline.
pub(crate) async fn file_endpoint(
    State(context): State<Arc<BackofficeContext>>,
    Path((fiscal_code, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }

    match context.backoffice.read_file(&fiscal_code, &path) {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.to_string())],
                bytes,
            )
                .into_response()
        }
        Err(BackofficeError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "file non trovato" })),
        )
            .into_response(),
        Err(BackofficeError::IllegalPath(_)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "percorso non valido" })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "file read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}
