//! Command implementations.

pub mod chunks;
pub mod extract;
pub mod listen;

pub use self::chunks::execute_chunks;
pub use self::extract::execute_extract;
pub use self::listen::execute_listen;

use crate::error::Result;
use ruleforge_domain::{DocumentReader, DocumentRef};
use ruleforge_jobs::{document_text, FileDocumentReader, JobError, SizeLimit};
use std::path::Path;

/// A local document loaded as plain text
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Base identifier stamped on findings
    pub source_id: String,
    /// Extracted text
    pub text: String,
}

/// Read a local PDF or text file, enforcing the size limit
pub async fn load_document(path: &Path, max_document_mb: u64) -> Result<LoadedDocument> {
    let document = DocumentRef::Path(path.to_path_buf());
    let reader = FileDocumentReader::new(SizeLimit::megabytes(max_document_mb));
    let fetched = reader.fetch(&document).await.map_err(JobError::from)?;
    let text = document_text(fetched, None).await?;

    Ok(LoadedDocument {
        source_id: document.source_id(),
        text,
    })
}
