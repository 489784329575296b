use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::auth::{authorize, issue_session_token, CredentialVerifier};
use super::query::{Backoffice, BackofficeError};

/// Everything the back-office routes need.
pub struct BackofficeContext {
    pub backoffice: Backoffice,
    pub credentials: Arc<dyn CredentialVerifier>,
}

/// Router builder for login and the admin read surface. File previewing
/// lives in the API service, which adds content-type guessing on top of
/// [`Backoffice::read_file`].
pub fn backoffice_router(context: Arc<BackofficeContext>) -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(login_handler))
        .route("/api/v1/backoffice/submissions", get(submissions_handler))
        .route("/api/v1/backoffice/media/:fiscal_code", get(media_handler))
        .route(
            "/api/v1/backoffice/verify/:fiscal_code",
            get(verify_handler),
        )
        .route(
            "/api/v1/backoffice/download/:fiscal_code",
            get(download_handler),
        )
        .with_state(context)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    username: String,
    password: String,
}

pub(crate) async fn login_handler(
    State(context): State<Arc<BackofficeContext>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    if context
        .credentials
        .verify(&request.username, &request.password)
    {
        info!(username = %request.username, "back-office login");
        let token = issue_session_token(&request.username);
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "token": token,
                "message": "login effettuato con successo",
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "credenziali non valide" })),
        )
            .into_response()
    }
}

pub(crate) async fn submissions_handler(
    State(context): State<Arc<BackofficeContext>>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }

    match context.backoffice.list_submissions() {
        Ok(submissions) => {
            (StatusCode::OK, Json(json!({ "submissions": submissions }))).into_response()
        }
        Err(err) => internal_error(err),
    }
}

pub(crate) async fn media_handler(
    State(context): State<Arc<BackofficeContext>>,
    Path(fiscal_code): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }

    match context.backoffice.media(&fiscal_code) {
        Ok(mut listing) => {
            // Relative paths become API paths the admin UI can fetch.
            for entry in listing.images.iter_mut().chain(listing.documents.iter_mut()) {
                entry.path = format!("/api/v1/backoffice/files/{fiscal_code}/{}", entry.path);
            }
            (StatusCode::OK, Json(listing)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn verify_handler(
    State(context): State<Arc<BackofficeContext>>,
    Path(fiscal_code): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }

    match context.backoffice.verify(&fiscal_code) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn download_handler(
    State(context): State<Arc<BackofficeContext>>,
    Path(fiscal_code): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = authorize(&headers) {
        return denied;
    }

    match context.backoffice.archive(&fiscal_code) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{fiscal_code}.zip\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: BackofficeError) -> Response {
    match err {
        BackofficeError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "candidatura non trovata" })),
        )
            .into_response(),
        BackofficeError::IllegalPath(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "percorso non valido" })),
        )
            .into_response(),
        other => internal_error(other),
    }
}

fn internal_error(err: BackofficeError) -> Response {
    error!(error = %err, "back-office query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}
