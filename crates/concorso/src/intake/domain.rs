use serde::{Deserialize, Serialize};

/// Per-category photo cap, re-validated server-side regardless of what the
/// client form enforced.
pub const MAX_PHOTOS_PER_CATEGORY: usize = 3;

/// Contest rules accept JPEG only, at most 3 MB per photo.
pub const MAX_PHOTO_BYTES: usize = 3 * 1024 * 1024;
pub const PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// The seven fixed contest sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhotoCategory {
    /// Tema libero
    FreeTheme,
    /// Ritratti ambientati
    EnvironmentalPortrait,
    /// Flora e fauna
    FloraFauna,
    /// Fotografie panoramiche e luoghi di interesse
    Panoramic,
    /// Piazze, monumenti ed edifici storici
    Monuments,
    /// Arti, mestieri e tradizioni
    CraftsTraditions,
    /// Enogastronomia
    FoodAndWine,
}

impl PhotoCategory {
    pub const ALL: [PhotoCategory; 7] = [
        PhotoCategory::FreeTheme,
        PhotoCategory::EnvironmentalPortrait,
        PhotoCategory::FloraFauna,
        PhotoCategory::Panoramic,
        PhotoCategory::Monuments,
        PhotoCategory::CraftsTraditions,
        PhotoCategory::FoodAndWine,
    ];

    /// Two-letter code used in folder names and upload metadata.
    pub const fn code(self) -> &'static str {
        match self {
            PhotoCategory::FreeTheme => "TL",
            PhotoCategory::EnvironmentalPortrait => "RA",
            PhotoCategory::FloraFauna => "WL",
            PhotoCategory::Panoramic => "PA",
            PhotoCategory::Monuments => "ME",
            PhotoCategory::CraftsTraditions => "AM",
            PhotoCategory::FoodAndWine => "EN",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PhotoCategory::FreeTheme => "Tema libero",
            PhotoCategory::EnvironmentalPortrait => "Ritratti ambientati",
            PhotoCategory::FloraFauna => "Flora e fauna",
            PhotoCategory::Panoramic => "Fotografie panoramiche e luoghi di interesse",
            PhotoCategory::Monuments => "Piazze, monumenti ed edifici storici",
            PhotoCategory::CraftsTraditions => "Arti, mestieri e tradizioni",
            PhotoCategory::FoodAndWine => "Enogastronomia",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|category| category.code() == code)
    }
}

/// Employment relationship declared by the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentCategory {
    /// No employment relationship with the organizing bodies.
    None,
    /// Employee of the metropolitan city administration.
    MetropolitanCity,
    /// Employee supplied through a staffing agency.
    StaffingAgency,
}

impl EmploymentCategory {
    pub const fn code(self) -> &'static str {
        match self {
            EmploymentCategory::None => "nessuno",
            EmploymentCategory::MetropolitanCity => "citta_metropolitana",
            EmploymentCategory::StaffingAgency => "somministrato",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "nessuno" | "no" => Some(EmploymentCategory::None),
            "citta_metropolitana" => Some(EmploymentCategory::MetropolitanCity),
            "somministrato" => Some(EmploymentCategory::StaffingAgency),
            _ => None,
        }
    }
}

/// Identity fields collected in the first step of the entry form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicantDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub fiscal_code: String,
    /// Declared birth date as submitted (ISO `YYYY-MM-DD`); cross-checked
    /// against the fiscal code by the caller, echoed into the manifest.
    pub birth_date: String,
    pub birth_place: String,
    pub residence_municipality: String,
    pub residence_address: String,
    pub employment: EmploymentCategory,
}

/// Mandatory consent checkboxes; a submission is valid only with all four.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Declarations {
    pub photo_authorship: bool,
    pub content_suitability: bool,
    pub terms_accepted: bool,
    pub privacy_accepted: bool,
}

impl Declarations {
    pub const fn all_accepted(self) -> bool {
        self.photo_authorship
            && self.content_suitability
            && self.terms_accepted
            && self.privacy_accepted
    }
}

/// A photograph with its section metadata, as received from the form.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub original_name: String,
    pub content_type: String,
    pub category: PhotoCategory,
    /// Municipality where the photo was taken.
    pub municipality: String,
    pub title: String,
    pub bytes: Vec<u8>,
}

/// An uploaded PDF document (signed participation form or consent release).
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// One complete intake submission. The three client-side wizard steps are
/// collapsed into a single atomic call to the pipeline.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub details: ApplicantDetails,
    pub declarations: Declarations,
    /// Signed participation form (Allegato 1); mandatory.
    pub signed_form: Option<DocumentUpload>,
    /// Signed consent release (liberatoria); optional.
    pub consent_release: Option<DocumentUpload>,
    pub photos: Vec<PhotoUpload>,
}

/// Returned to the client on successful persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    #[serde(rename = "codiceFiscale")]
    pub fiscal_code: String,
    #[serde(rename = "filesCount")]
    pub file_count: usize,
}

/// Replace every character outside `[A-Za-z0-9_.-]` with an underscore.
pub fn sanitize_file_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Storage name for a photo: `Cognome_Nome_Categoria_Comune_Titolo.<ext>`,
/// sanitized, with the extension taken from the original upload name.
pub fn photo_storage_name(details: &ApplicantDetails, photo: &PhotoUpload) -> String {
    let extension = photo
        .original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "jpg".to_string());

    let stem = format!(
        "{}_{}_{}_{}_{}",
        details.last_name,
        details.first_name,
        photo.category.code(),
        photo.municipality,
        photo.title
    );

    format!("{}.{}", sanitize_file_name(&stem), sanitize_file_name(&extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> ApplicantDetails {
        ApplicantDetails {
            first_name: "Mario".to_string(),
            last_name: "Ro$$i".to_string(),
            email: "mario@example.com".to_string(),
            phone: "3331234567".to_string(),
            fiscal_code: "RSSMRA80A01H501U".to_string(),
            birth_date: "1980-01-01".to_string(),
            birth_place: "Roma".to_string(),
            residence_municipality: "Roma".to_string(),
            residence_address: "Via Appia 1".to_string(),
            employment: EmploymentCategory::None,
        }
    }

    #[test]
    fn category_codes_round_trip() {
        for category in PhotoCategory::ALL {
            assert_eq!(PhotoCategory::from_code(category.code()), Some(category));
        }
        assert_eq!(PhotoCategory::from_code("tl"), Some(PhotoCategory::FreeTheme));
        assert_eq!(PhotoCategory::from_code("XX"), None);
    }

    #[test]
    fn sanitization_replaces_each_disallowed_character() {
        assert_eq!(sanitize_file_name("Ro$$i"), "Ro__i");
        assert_eq!(sanitize_file_name("Roma Est"), "Roma_Est");
        assert_eq!(sanitize_file_name("gia-valido_1.jpg"), "gia-valido_1.jpg");
    }

    #[test]
    fn photo_storage_name_follows_renaming_rule() {
        let photo = PhotoUpload {
            original_name: "IMG_0001.JPG".to_string(),
            content_type: PHOTO_CONTENT_TYPE.to_string(),
            category: PhotoCategory::FreeTheme,
            municipality: "Roma Est".to_string(),
            title: "Alba!".to_string(),
            bytes: Vec::new(),
        };
        assert_eq!(
            photo_storage_name(&details(), &photo),
            "Ro__i_Mario_TL_Roma_Est_Alba_.jpg"
        );
    }

    #[test]
    fn photo_storage_name_defaults_missing_extension_to_jpg() {
        let photo = PhotoUpload {
            original_name: "scatto".to_string(),
            content_type: PHOTO_CONTENT_TYPE.to_string(),
            category: PhotoCategory::FoodAndWine,
            municipality: "Tivoli".to_string(),
            title: "Vigna".to_string(),
            bytes: Vec::new(),
        };
        assert!(photo_storage_name(&details(), &photo).ends_with("EN_Tivoli_Vigna.jpg"));
    }

    #[test]
    fn declarations_require_all_four_consents() {
        let mut declarations = Declarations {
            photo_authorship: true,
            content_suitability: true,
            terms_accepted: true,
            privacy_accepted: true,
        };
        assert!(declarations.all_accepted());
        declarations.privacy_accepted = false;
        assert!(!declarations.all_accepted());
    }
}
