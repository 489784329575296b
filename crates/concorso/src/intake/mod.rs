//! Submission intake: domain model, persistence pipeline, on-disk store,
//! manifest/audit-log emission, and the multipart HTTP endpoint.

pub mod domain;
pub mod manifest;
pub mod pipeline;
pub mod router;
pub mod store;

pub use domain::{
    photo_storage_name, sanitize_file_name, ApplicantDetails, Declarations, DocumentUpload,
    EmploymentCategory, PhotoCategory, PhotoUpload, SubmissionReceipt, SubmissionRequest,
    MAX_PHOTOS_PER_CATEGORY, MAX_PHOTO_BYTES, PHOTO_CONTENT_TYPE,
};
pub use manifest::{render_audit_log, Manifest, Participant, StoredFile};
pub use pipeline::{SubmissionError, SubmissionPipeline};
pub use router::intake_router;
pub use store::{DirectoryClaim, FsSubmissionStore, StoreError, SubmissionStore};
