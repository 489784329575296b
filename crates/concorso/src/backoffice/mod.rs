//! Administrative read surface over the submission tree: listing, media
//! preview, integrity verification, zip export, and the credential/token
//! boundary in front of it all.

pub mod archive;
pub mod auth;
pub mod query;
pub mod router;

pub use auth::{
    authorize, issue_session_token, token_is_plausible, CredentialVerifier, StaticCredentials,
    MIN_TOKEN_LEN,
};
pub use query::{
    Backoffice, BackofficeError, FileEntry, IntegrityReport, MediaListing, SubmissionSummary,
};
pub use router::{backoffice_router, BackofficeContext};
