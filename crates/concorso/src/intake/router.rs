use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{
    ApplicantDetails, Declarations, DocumentUpload, EmploymentCategory, PhotoCategory, PhotoUpload,
    SubmissionRequest,
};
use super::pipeline::{SubmissionError, SubmissionPipeline};
use super::store::SubmissionStore;

/// Router builder exposing the intake endpoint.
pub fn intake_router<S>(pipeline: Arc<SubmissionPipeline<S>>) -> Router
where
    S: SubmissionStore + 'static,
{
    Router::new()
        .route("/api/v1/submissions", post(submit_handler::<S>))
        .with_state(pipeline)
}

/// Per-photo metadata, one `fotoMeta` JSON field per `foto` part.
#[derive(Debug, Deserialize)]
struct PhotoMeta {
    categoria: String,
    comune: String,
    titolo: String,
}

#[derive(Debug)]
struct RawPhoto {
    original_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

pub(crate) async fn submit_handler<S>(
    State(pipeline): State<Arc<SubmissionPipeline<S>>>,
    multipart: Multipart,
) -> Response
where
    S: SubmissionStore + 'static,
{
    let request = match collect_submission(multipart).await {
        Ok(request) => request,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "error": message, "kind": "validation_error" })),
            )
                .into_response()
        }
    };

    match pipeline.submit(request) {
        Ok(receipt) => (
            StatusCode::OK,
            axum::Json(json!({
                "success": true,
                "message": "registrazione completata con successo",
                "codiceFiscale": receipt.fiscal_code,
                "filesCount": receipt.file_count,
            })),
        )
            .into_response(),
        Err(err) => {
            let status = match &err {
                SubmissionError::Validation(_) => StatusCode::BAD_REQUEST,
                SubmissionError::Duplicate => StatusCode::CONFLICT,
                SubmissionError::Storage(storage) => {
                    error!(error = %storage, "submission persistence failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                axum::Json(json!({ "error": err.to_string(), "kind": err.kind() })),
            )
                .into_response()
        }
    }
}

/// Walk the multipart stream into a structured submission. Field-level
/// problems (unreadable part, malformed metadata, unknown category) are
/// reported as validation messages; field presence is the pipeline's job.
async fn collect_submission(mut multipart: Multipart) -> Result<SubmissionRequest, String> {
    let mut text_fields: std::collections::HashMap<String, String> =
        std::collections::HashMap::new();
    let mut signed_form = None;
    let mut consent_release = None;
    let mut raw_photos: Vec<RawPhoto> = Vec::new();
    let mut photo_meta: Vec<PhotoMeta> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| format!("richiesta multipart non valida: {err}"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "allegato1" | "liberatoria" => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| format!("lettura del file '{name}' fallita: {err}"))?
                    .to_vec();
                let upload = DocumentUpload {
                    original_name,
                    bytes,
                };
                if name == "allegato1" {
                    signed_form = Some(upload);
                } else {
                    consent_release = Some(upload);
                }
            }
            "foto" => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| format!("lettura della foto '{original_name}' fallita: {err}"))?
                    .to_vec();
                raw_photos.push(RawPhoto {
                    original_name,
                    content_type,
                    bytes,
                });
            }
            "fotoMeta" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|err| format!("lettura di 'fotoMeta' fallita: {err}"))?;
                let meta: PhotoMeta = serde_json::from_str(&raw)
                    .map_err(|_| "metadati foto non validi".to_string())?;
                photo_meta.push(meta);
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| format!("lettura del campo '{name}' fallita: {err}"))?;
                text_fields.insert(name, value);
            }
        }
    }

    if raw_photos.len() != photo_meta.len() {
        return Err("ogni foto deve avere i propri metadati".to_string());
    }

    let mut photos = Vec::with_capacity(raw_photos.len());
    for (raw, meta) in raw_photos.into_iter().zip(photo_meta) {
        if meta.categoria.trim().is_empty() {
            return Err(format!("{}: categoria mancante", raw.original_name));
        }
        let category = PhotoCategory::from_code(&meta.categoria)
            .ok_or_else(|| format!("categoria sconosciuta '{}'", meta.categoria))?;
        photos.push(PhotoUpload {
            original_name: raw.original_name,
            content_type: raw.content_type,
            category,
            municipality: meta.comune,
            title: meta.titolo,
            bytes: raw.bytes,
        });
    }

    let mut take = |key: &str| text_fields.remove(key).unwrap_or_default();

    let employment_raw = take("dipendente");
    if employment_raw.trim().is_empty() {
        return Err("il campo 'dipendente' e obbligatorio".to_string());
    }
    let employment = EmploymentCategory::from_code(&employment_raw)
        .ok_or_else(|| format!("valore 'dipendente' sconosciuto: '{employment_raw}'"))?;

    let details = ApplicantDetails {
        first_name: take("nome"),
        last_name: take("cognome"),
        email: take("email"),
        phone: take("telefono"),
        fiscal_code: take("codiceFiscale"),
        birth_date: take("dataNascita"),
        birth_place: take("luogoNascita"),
        residence_municipality: take("residenzaComune"),
        residence_address: take("residenzaIndirizzo"),
        employment,
    };

    let flag = |value: String| value.trim().eq_ignore_ascii_case("true");
    let declarations = Declarations {
        photo_authorship: flag(take("dichiarazionePaternita")),
        content_suitability: flag(take("dichiarazioneContenuti")),
        terms_accepted: flag(take("accettazioneRegolamento")),
        privacy_accepted: flag(take("accettazionePrivacy")),
    };

    Ok(SubmissionRequest {
        details,
        declarations,
        signed_form,
        consent_release,
        photos,
    })
}
