//! Temporary on-disk copy of an uploaded clip.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::types::{ContainerFormat, UploadedClip};
use crate::error::ShiftError;

/// A staged upload. The file is deleted when the guard is dropped.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    format: ContainerFormat,
}

impl StagedFile {
    #[inline]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Format taken from the declared filename.
    #[inline]
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Deletes the file now, reporting any failure.
    pub fn close(self) -> Result<(), ShiftError> {
        let path = self.file.path().to_path_buf();
        self.file
            .close()
            .map_err(|e| ShiftError::Io(format!("{}: {}", path.display(), e)))
    }
}

/// Writes the clip to a uniquely named temporary file carrying the declared
/// extension, in `dir` or the system temp directory.
///
/// # Errors
///
/// Returns [`ShiftError::Io`] if the file cannot be created or written.
pub fn stage(clip: &UploadedClip, dir: Option<&Path>) -> Result<StagedFile, ShiftError> {
    let format = clip.declared_format();
    if let Some(sniffed) = ContainerFormat::sniff(&clip.bytes) {
        if sniffed != format {
            log::warn!(
                "'{}' is declared as {} but looks like {}",
                clip.name,
                format,
                sniffed
            );
        }
    }

    let suffix = format!(".{}", format.extension());
    let mut builder = tempfile::Builder::new();
    builder.prefix("upload-").suffix(&suffix);
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }?;

    file.write_all(&clip.bytes)?;
    file.flush()?;

    log::debug!(
        "staged {} bytes of '{}' ({}) at {}",
        clip.len(),
        clip.name,
        format.mime_type(),
        file.path().display()
    );
    Ok(StagedFile { file, format })
}
