//! The two artifacts that close a submission: `dati.json`, the canonical
//! machine-readable manifest, and `log.txt`, the human-readable audit trail.
//! `dati.json` doubles as the completion marker; the back office treats a
//! folder without one as not a valid submission.

use serde::{Deserialize, Serialize};

use super::domain::{ApplicantDetails, EmploymentCategory};

/// One stored file: path relative to the applicant folder, content digest,
/// and byte size. Together with the stored bytes this must round-trip: the
/// recorded hash always equals the hash recomputed from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    #[serde(rename = "filename")]
    pub relative_path: String,
    pub hash: String,
    pub size: u64,
}

/// Identity fields echoed into the manifest, under the Italian wire names
/// the entry form submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "nome")]
    pub first_name: String,
    #[serde(rename = "cognome")]
    pub last_name: String,
    pub email: String,
    #[serde(rename = "codiceFiscale")]
    pub fiscal_code: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "dataNascita")]
    pub birth_date: String,
    #[serde(rename = "luogoNascita")]
    pub birth_place: String,
    #[serde(rename = "residenzaComune")]
    pub residence_municipality: String,
    #[serde(rename = "residenzaIndirizzo")]
    pub residence_address: String,
    #[serde(rename = "dipendente")]
    pub employment: String,
}

impl From<&ApplicantDetails> for Participant {
    fn from(details: &ApplicantDetails) -> Self {
        Self {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            email: details.email.clone(),
            fiscal_code: details.fiscal_code.clone(),
            phone: details.phone.clone(),
            birth_date: details.birth_date.clone(),
            birth_place: details.birth_place.clone(),
            residence_municipality: details.residence_municipality.clone(),
            residence_address: details.residence_address.clone(),
            employment: details.employment.code().to_string(),
        }
    }
}

impl Participant {
    pub fn employment_category(&self) -> Option<EmploymentCategory> {
        EmploymentCategory::from_code(&self.employment)
    }
}

/// `dati.json` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "partecipante")]
    pub participant: Participant,
    /// UTC submission instant, RFC 3339 with milliseconds.
    pub timestamp: String,
    pub files: Vec<StoredFile>,
}

impl Manifest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

fn size_in_megabytes(size: u64) -> String {
    format!("{:.2}", size as f64 / 1024.0 / 1024.0)
}

/// Render the `log.txt` banner layout.
pub fn render_audit_log(manifest: &Manifest) -> String {
    let participant = &manifest.participant;
    let mut log = format!(
        "=================================================\n\
         CONCORSO FOTOGRAFICO - LOG PARTECIPANTE\n\
         =================================================\n\
         \n\
         DATI PARTECIPANTE:\n\
         ------------------\n\
         Nome: {}\n\
         Cognome: {}\n\
         Email: {}\n\
         Telefono: {}\n\
         Codice Fiscale: {}\n\
         Data di Nascita: {}\n\
         Luogo di Nascita: {}\n\
         Comune di Residenza: {}\n\
         Indirizzo: {}\n\
         Dipendente: {}\n\
         \n\
         DATA E ORA INVIO:\n\
         -----------------\n\
         {}\n\
         \n\
         FILE CARICATI (SHA-256):\n\
         -------------------------\n",
        participant.first_name,
        participant.last_name,
        participant.email,
        participant.phone,
        participant.fiscal_code,
        participant.birth_date,
        participant.birth_place,
        participant.residence_municipality,
        participant.residence_address,
        participant.employment,
        manifest.timestamp,
    );

    for (index, file) in manifest.files.iter().enumerate() {
        log.push_str(&format!(
            "\n{}. {}\n   SHA-256: {}\n   Dimensione: {} MB\n",
            index + 1,
            file.relative_path,
            file.hash,
            size_in_megabytes(file.size),
        ));
    }

    log.push_str(&format!(
        "\n=================================================\n\
         Totale file: {}\n\
         =================================================\n",
        manifest.files.len()
    ));

    log
}
