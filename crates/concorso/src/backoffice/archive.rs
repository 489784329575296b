//! Per-applicant zip export: everything the pipeline wrote for one fiscal
//! code, bundled in memory with relative paths preserved.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::query::{Backoffice, BackofficeError};

impl Backoffice {
    /// Build `<FISCAL_CODE>.zip` contents: `dati.json`, `log.txt`, and the
    /// `immagini/` and `documenti/` subtrees.
    pub fn archive(&self, fiscal_code: &str) -> Result<Vec<u8>, BackofficeError> {
        let folder = self.applicant_dir_checked(fiscal_code)?;

        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = FileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(0o644);

            for name in ["dati.json", "log.txt"] {
                let path = folder.join(name);
                if path.is_file() {
                    zip.start_file(name, options)?;
                    zip.write_all(&fs::read(path)?)?;
                }
            }

            for subtree in ["immagini", "documenti"] {
                let base = folder.join(subtree);
                if base.is_dir() {
                    add_tree(&mut zip, &base, subtree, options)?;
                }
            }

            zip.finish()?;
        }

        Ok(buffer)
    }
}

fn add_tree(
    zip: &mut ZipWriter<Cursor<&mut Vec<u8>>>,
    dir: &Path,
    relative: &str,
    options: FileOptions,
) -> Result<(), BackofficeError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_relative = format!("{relative}/{name}");
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            add_tree(zip, &entry.path(), &child_relative, options)?;
        } else if file_type.is_file() {
            zip.start_file(&child_relative, options)?;
            zip.write_all(&fs::read(entry.path())?)?;
        }
    }
    Ok(())
}
