//! Scoped staging of fetched documents and text extraction
//!
//! A fetched document is written to a temporary file that lives exactly as
//! long as its [`StagedDocument`]. The file is removed when the guard drops,
//! including when text extraction fails or panics.

use crate::error::JobError;
use ruleforge_domain::{DocumentKind, FetchedDocument};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A document held in transient storage
pub struct StagedDocument {
    file: NamedTempFile,
    kind: DocumentKind,
}

impl StagedDocument {
    /// Write `document` to a temporary file in `dir` (or the system temp dir)
    pub fn stage(document: &FetchedDocument, dir: Option<&Path>) -> Result<Self, JobError> {
        let kind = DocumentKind::detect(&document.bytes, document.file_name.as_deref()).ok_or_else(|| {
            JobError::UnsupportedType(document.file_name.clone().unwrap_or_else(|| "<unnamed>".to_string()))
        })?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("ruleforge-").suffix(kind.suffix());
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&document.bytes)?;
        file.flush()?;

        debug!(path = %file.path().display(), kind = ?kind, "Document staged");
        Ok(Self { file, kind })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Extract the plain text of the staged document
    pub fn read_text(&self) -> Result<String, JobError> {
        let bytes = std::fs::read(self.path())?;
        match self.kind {
            DocumentKind::Pdf => pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| JobError::Document(format!("Failed to extract PDF text: {}", e))),
            DocumentKind::Text => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

/// Stage `document`, extract its text and release the staged file
///
/// Runs on the blocking pool; PDF parsing is CPU bound. The staged file is
/// gone by the time this returns, whatever the outcome.
pub async fn document_text(document: FetchedDocument, dir: Option<PathBuf>) -> Result<String, JobError> {
    tokio::task::spawn_blocking(move || {
        let staged = StagedDocument::stage(&document, dir.as_deref())?;
        staged.read_text()
    })
    .await
    .map_err(|e| JobError::Worker(format!("Text extraction task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_document(body: &str) -> FetchedDocument {
        FetchedDocument {
            file_name: Some("rules.md".to_string()),
            bytes: body.as_bytes().to_vec(),
        }
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_staged_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedDocument::stage(&text_document("1 Scope\n"), Some(dir.path())).unwrap();

        assert_eq!(staged.kind(), DocumentKind::Text);
        assert!(staged.path().starts_with(dir.path()));
        assert_eq!(entries(dir.path()), 1);

        drop(staged);
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_unsupported_bytes_are_not_staged() {
        let dir = tempfile::tempdir().unwrap();
        let doc = FetchedDocument {
            file_name: Some("archive.bin".to_string()),
            bytes: vec![0xff, 0xfe, 0x00, 0x81],
        };

        let result = StagedDocument::stage(&doc, Some(dir.path()));
        assert!(matches!(result, Err(JobError::UnsupportedType(_))));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_document_text_releases_file() {
        let dir = tempfile::tempdir().unwrap();
        let text = document_text(text_document("1 Scope\nNo ads.\n"), Some(dir.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(text, "1 Scope\nNo ads.\n");
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_corrupt_pdf_releases_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = FetchedDocument {
            file_name: Some("broken.pdf".to_string()),
            bytes: b"%PDF-1.7\nthis is not really a pdf".to_vec(),
        };

        let result = document_text(doc, Some(dir.path().to_path_buf())).await;
        assert!(result.is_err());
        assert_eq!(entries(dir.path()), 0);
    }
}
