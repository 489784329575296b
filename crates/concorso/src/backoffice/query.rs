use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::intake::manifest::{Manifest, Participant};

/// Read-only view over the submission tree the intake pipeline wrote.
#[derive(Debug, Clone)]
pub struct Backoffice {
    root: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum BackofficeError {
    #[error("candidatura non trovata")]
    NotFound,
    #[error("illegal path: {0}")]
    IllegalPath(String),
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest corrotto: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("archive failure: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// One row of the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    #[serde(flatten)]
    pub participant: Participant,
    pub timestamp: String,
    #[serde(rename = "imagesCount")]
    pub images_count: usize,
    #[serde(rename = "hasAllegato1")]
    pub has_signed_form: bool,
    #[serde(rename = "hasLiberatoria")]
    pub has_consent_release: bool,
}

/// A previewable file, with its path relative to the applicant folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
}

/// Media listing split the way the admin UI renders it.
#[derive(Debug, Clone, Serialize)]
pub struct MediaListing {
    pub images: Vec<FileEntry>,
    #[serde(rename = "documenti")]
    pub documents: Vec<FileEntry>,
}

/// Result of re-hashing stored files against the manifest.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub ok: bool,
    pub mismatched: Vec<String>,
    pub missing: Vec<String>,
}

impl Backoffice {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn applicant_dir(&self, fiscal_code: &str) -> Result<PathBuf, BackofficeError> {
        // Fiscal codes never contain separators; anything else is a crafted
        // request, not a lookup miss.
        let safe = Path::new(fiscal_code)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
            && !fiscal_code.contains(['/', '\\']);
        if !safe || fiscal_code.is_empty() {
            return Err(BackofficeError::IllegalPath(fiscal_code.to_string()));
        }
        Ok(self.root.join(fiscal_code))
    }

    /// Applicant summaries, newest first. Folders without a parseable
    /// `dati.json` are incomplete submissions and are skipped.
    pub fn list_submissions(&self) -> Result<Vec<SubmissionSummary>, BackofficeError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let folder = entry.path();
            let manifest = match read_manifest(&folder) {
                Ok(Some(manifest)) => manifest,
                Ok(None) => continue,
                Err(err) => {
                    warn!(folder = %folder.display(), error = %err, "skipping unreadable submission");
                    continue;
                }
            };

            let documents_dir = folder.join("documenti");
            let has_signed_form = dir_has_prefix(&documents_dir, "Allegato1")?;
            let has_consent_release = dir_has_prefix(&documents_dir, "Liberatoria")?;

            summaries.push(SubmissionSummary {
                participant: manifest.participant,
                timestamp: manifest.timestamp,
                images_count: count_files(&folder.join("immagini"))?,
                has_signed_form,
                has_consent_release,
            });
        }

        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(summaries)
    }

    /// Photo and document listings for one applicant.
    pub fn media(&self, fiscal_code: &str) -> Result<MediaListing, BackofficeError> {
        let folder = self.applicant_dir(fiscal_code)?;
        if !folder.is_dir() {
            return Err(BackofficeError::NotFound);
        }

        Ok(MediaListing {
            images: collect_files(&folder, "immagini")?,
            documents: collect_files(&folder, "documenti")?,
        })
    }

    /// Bytes of a single stored file, addressed relative to the applicant
    /// folder (e.g. `immagini/TL/foo.jpg`).
    pub fn read_file(&self, fiscal_code: &str, relative: &str) -> Result<Vec<u8>, BackofficeError> {
        let folder = self.applicant_dir(fiscal_code)?;
        let safe = Path::new(relative)
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(BackofficeError::IllegalPath(relative.to_string()));
        }

        let target = folder.join(relative);
        if !target.is_file() {
            return Err(BackofficeError::NotFound);
        }
        Ok(fs::read(target)?)
    }

    /// Recompute every manifest hash against the stored bytes.
    pub fn verify(&self, fiscal_code: &str) -> Result<IntegrityReport, BackofficeError> {
        let folder = self.applicant_dir(fiscal_code)?;
        let manifest = match read_manifest(&folder)? {
            Some(manifest) => manifest,
            None => return Err(BackofficeError::NotFound),
        };

        let mut mismatched = Vec::new();
        let mut missing = Vec::new();
        for file in &manifest.files {
            let path = folder.join(&file.relative_path);
            if !path.is_file() {
                missing.push(file.relative_path.clone());
                continue;
            }
            let bytes = fs::read(&path)?;
            if hex::encode(Sha256::digest(&bytes)) != file.hash || bytes.len() as u64 != file.size {
                mismatched.push(file.relative_path.clone());
            }
        }

        Ok(IntegrityReport {
            ok: mismatched.is_empty() && missing.is_empty(),
            mismatched,
            missing,
        })
    }

    pub(crate) fn applicant_dir_checked(
        &self,
        fiscal_code: &str,
    ) -> Result<PathBuf, BackofficeError> {
        let folder = self.applicant_dir(fiscal_code)?;
        if !folder.is_dir() {
            return Err(BackofficeError::NotFound);
        }
        Ok(folder)
    }
}

fn read_manifest(folder: &Path) -> Result<Option<Manifest>, BackofficeError> {
    let path = folder.join("dati.json");
    if !path.is_file() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    Ok(Some(Manifest::from_json(&raw)?))
}

fn dir_has_prefix(dir: &Path, prefix: &str) -> Result<bool, BackofficeError> {
    if !dir.is_dir() {
        return Ok(false);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn count_files(dir: &Path) -> Result<usize, BackofficeError> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            count += count_files(&entry.path())?;
        } else if file_type.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// Files under one subtree of the applicant folder, relative paths included,
/// sorted by name for a stable listing.
fn collect_files(folder: &Path, subtree: &str) -> Result<Vec<FileEntry>, BackofficeError> {
    let base = folder.join(subtree);
    let mut entries = Vec::new();
    if base.is_dir() {
        walk(&base, subtree, &mut entries)?;
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn walk(dir: &Path, relative: &str, out: &mut Vec<FileEntry>) -> Result<(), BackofficeError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_relative = format!("{relative}/{name}");
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk(&entry.path(), &child_relative, out)?;
        } else if file_type.is_file() {
            out.push(FileEntry {
                name,
                path: child_relative,
                size: entry.metadata()?.len(),
            });
        }
    }
    Ok(())
}
