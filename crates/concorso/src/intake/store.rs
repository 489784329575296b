use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::domain::PhotoCategory;

/// Outcome of the exclusive per-applicant directory claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryClaim {
    Created,
    AlreadyExists,
}

/// Errors surfaced by the storage layer. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("illegal storage path: {0}")]
    IllegalPath(String),
}

/// Filesystem abstraction for the intake pipeline.
///
/// `claim_applicant` must be atomic: two concurrent claims for the same
/// fiscal code resolve to exactly one `Created` and one `AlreadyExists`,
/// never two `Created`. An exists-probe followed by a create is not an
/// acceptable implementation.
pub trait SubmissionStore: Send + Sync {
    fn claim_applicant(&self, fiscal_code: &str) -> Result<DirectoryClaim, StoreError>;
    fn write_file(
        &self,
        fiscal_code: &str,
        relative_path: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError>;
}

/// Store writing each applicant under `<root>/<FISCAL_CODE>/`.
#[derive(Debug, Clone)]
pub struct FsSubmissionStore {
    root: PathBuf,
}

impl FsSubmissionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn applicant_dir(&self, fiscal_code: &str) -> PathBuf {
        self.root.join(fiscal_code)
    }
}

/// Reject anything but plain relative components, so a crafted file name
/// cannot escape the applicant's folder.
fn ensure_relative(path: &str) -> Result<&Path, StoreError> {
    let candidate = Path::new(path);
    let safe = candidate
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if safe {
        Ok(candidate)
    } else {
        Err(StoreError::IllegalPath(path.to_string()))
    }
}

impl SubmissionStore for FsSubmissionStore {
    fn claim_applicant(&self, fiscal_code: &str) -> Result<DirectoryClaim, StoreError> {
        fs::create_dir_all(&self.root)?;

        // create_dir (not create_dir_all) fails when the target exists,
        // which is the whole duplicate guard: check and claim are one step.
        let dir = self.applicant_dir(fiscal_code);
        match fs::create_dir(&dir) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Ok(DirectoryClaim::AlreadyExists)
            }
            Err(err) => return Err(err.into()),
        }

        fs::create_dir(dir.join("documenti"))?;
        let photos = dir.join("immagini");
        fs::create_dir(&photos)?;
        for category in PhotoCategory::ALL {
            fs::create_dir(photos.join(category.code()))?;
        }

        Ok(DirectoryClaim::Created)
    }

    fn write_file(
        &self,
        fiscal_code: &str,
        relative_path: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        let relative = ensure_relative(relative_path)?;
        let target = self.applicant_dir(fiscal_code).join(relative);
        fs::write(target, bytes)?;
        Ok(())
    }
}
