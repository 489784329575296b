use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::domain::{
    photo_storage_name, SubmissionReceipt, SubmissionRequest, MAX_PHOTOS_PER_CATEGORY,
    MAX_PHOTO_BYTES, PHOTO_CONTENT_TYPE,
};
use super::manifest::{render_audit_log, Manifest, Participant, StoredFile};
use super::store::{DirectoryClaim, StoreError, SubmissionStore};
use crate::fiscal_code::FISCAL_CODE_LEN;

/// Persists one submission as an applicant folder: claimed exclusively,
/// populated with documents and categorized photos, then sealed with the
/// audit log and the `dati.json` manifest.
pub struct SubmissionPipeline<S> {
    store: Arc<S>,
}

/// Failure taxonomy of the pipeline. `Validation` is client-correctable,
/// `Duplicate` is a business-rule conflict, `Storage` is fatal to the
/// request and leaves any partial folder visible but unsealed.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Validation(String),
    #[error("esiste gia una candidatura per questo codice fiscale")]
    Duplicate,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl SubmissionError {
    /// Machine-readable kind for API payloads.
    pub const fn kind(&self) -> &'static str {
        match self {
            SubmissionError::Validation(_) => "validation_error",
            SubmissionError::Duplicate => "duplicate_submission",
            SubmissionError::Storage(_) => "storage_error",
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

impl<S: SubmissionStore> SubmissionPipeline<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate and persist one submission.
    ///
    /// All validation happens before the directory claim, so a rejected
    /// submission never leaves anything on disk.
    pub fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, SubmissionError> {
        let mut request = request;
        request.details.fiscal_code = request.details.fiscal_code.trim().to_ascii_uppercase();

        validate(&request)?;

        let fiscal_code = request.details.fiscal_code.clone();
        match self.store.claim_applicant(&fiscal_code)? {
            DirectoryClaim::Created => {}
            DirectoryClaim::AlreadyExists => {
                warn!(%fiscal_code, "duplicate submission rejected");
                return Err(SubmissionError::Duplicate);
            }
        }

        let mut files = Vec::new();

        if let Some(form) = &request.signed_form {
            let path = format!("documenti/Allegato1_firmato_{fiscal_code}.pdf");
            self.store.write_file(&fiscal_code, &path, &form.bytes)?;
            files.push(StoredFile {
                relative_path: path,
                hash: sha256_hex(&form.bytes),
                size: form.bytes.len() as u64,
            });
        }

        if let Some(release) = &request.consent_release {
            let path = format!("documenti/Liberatoria_firmata_{fiscal_code}.pdf");
            self.store.write_file(&fiscal_code, &path, &release.bytes)?;
            files.push(StoredFile {
                relative_path: path,
                hash: sha256_hex(&release.bytes),
                size: release.bytes.len() as u64,
            });
        }

        let mut used_names = HashSet::new();
        for photo in &request.photos {
            let base_name = photo_storage_name(&request.details, photo);
            let name = disambiguate(&base_name, &mut used_names);
            let path = format!("immagini/{}/{}", photo.category.code(), name);
            self.store.write_file(&fiscal_code, &path, &photo.bytes)?;
            files.push(StoredFile {
                relative_path: path,
                hash: sha256_hex(&photo.bytes),
                size: photo.bytes.len() as u64,
            });
        }

        let manifest = Manifest {
            participant: Participant::from(&request.details),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            files,
        };

        self.store
            .write_file(&fiscal_code, "log.txt", render_audit_log(&manifest).as_bytes())?;

        let manifest_json = manifest
            .to_json()
            .map_err(|err| StoreError::Io(std::io::Error::other(err)))?;
        // Written last: this file is what marks the folder complete.
        self.store
            .write_file(&fiscal_code, "dati.json", manifest_json.as_bytes())?;

        let file_count = manifest.files.len();
        info!(%fiscal_code, file_count, "submission persisted");

        Ok(SubmissionReceipt {
            fiscal_code,
            file_count,
        })
    }
}

/// Two photos in the same category can render to the same storage name;
/// later ones get a numeric suffix instead of overwriting.
fn disambiguate(base_name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(base_name.to_string()) {
        return base_name.to_string();
    }
    let (stem, extension) = base_name
        .rsplit_once('.')
        .unwrap_or((base_name, "jpg"));
    let mut counter = 2;
    loop {
        let candidate = format!("{stem}_{counter}.{extension}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn validate(request: &SubmissionRequest) -> Result<(), SubmissionError> {
    let details = &request.details;
    let required = [
        ("nome", &details.first_name),
        ("cognome", &details.last_name),
        ("email", &details.email),
        ("telefono", &details.phone),
        ("codiceFiscale", &details.fiscal_code),
        ("dataNascita", &details.birth_date),
        ("luogoNascita", &details.birth_place),
        ("residenzaComune", &details.residence_municipality),
        ("residenzaIndirizzo", &details.residence_address),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(SubmissionError::Validation(format!(
                "il campo '{name}' e obbligatorio"
            )));
        }
    }

    if details.fiscal_code.len() != FISCAL_CODE_LEN {
        return Err(SubmissionError::Validation(
            "codice fiscale non valido".to_string(),
        ));
    }

    if !request.declarations.all_accepted() {
        return Err(SubmissionError::Validation(
            "tutte le dichiarazioni sono obbligatorie".to_string(),
        ));
    }

    if request.signed_form.is_none() {
        return Err(SubmissionError::Validation(
            "il modulo di partecipazione firmato (Allegato 1) e obbligatorio".to_string(),
        ));
    }

    if request.photos.is_empty() {
        return Err(SubmissionError::Validation(
            "devi caricare almeno una foto".to_string(),
        ));
    }

    let mut per_category: HashMap<&str, usize> = HashMap::new();
    for photo in &request.photos {
        if !photo.content_type.eq_ignore_ascii_case(PHOTO_CONTENT_TYPE) {
            return Err(SubmissionError::Validation(format!(
                "{}: formato non valido, accettato solo JPG",
                photo.original_name
            )));
        }
        if photo.bytes.len() > MAX_PHOTO_BYTES {
            return Err(SubmissionError::Validation(format!(
                "{}: dimensione superiore a 3MB",
                photo.original_name
            )));
        }
        let count = per_category.entry(photo.category.code()).or_insert(0);
        *count += 1;
        if *count > MAX_PHOTOS_PER_CATEGORY {
            return Err(SubmissionError::Validation(format!(
                "massimo {MAX_PHOTOS_PER_CATEGORY} foto per la categoria {}",
                photo.category.code()
            )));
        }
    }

    Ok(())
}
