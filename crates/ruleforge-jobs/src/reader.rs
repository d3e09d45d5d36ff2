//! Document readers for local paths and HTTP URLs

use async_trait::async_trait;
use reqwest::StatusCode;
use ruleforge_domain::{DocumentReader, DocumentRef, FetchError, FetchedDocument};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const MB: u64 = 1024 * 1024;

/// Size limit shared by all readers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimit {
    limit_mb: u64,
}

impl SizeLimit {
    /// Limit of `limit_mb` mebibytes
    pub fn megabytes(limit_mb: u64) -> Self {
        Self { limit_mb }
    }

    /// The limit in bytes
    pub fn bytes(&self) -> u64 {
        self.limit_mb.saturating_mul(MB)
    }

    /// Reject `size` if it exceeds the limit
    pub fn check(&self, size: u64) -> Result<(), FetchError> {
        if size > self.bytes() {
            return Err(FetchError::TooLarge {
                size,
                limit_mb: self.limit_mb,
            });
        }
        Ok(())
    }
}

/// Downloads documents over HTTP(S)
///
/// The declared `Content-Length` is checked before the body is read, and the
/// measured size is checked again while streaming.
pub struct HttpDocumentReader {
    client: reqwest::Client,
    limit: SizeLimit,
}

impl HttpDocumentReader {
    /// Build a reader whose downloads give up after `timeout`
    pub fn new(limit: SizeLimit, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, limit })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Transport(format!("{} returned {}", url, status)));
        }

        if let Some(declared) = response.content_length() {
            self.limit.check(declared)?;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
            self.limit.check(bytes.len() as u64)?;
        }
        Ok(bytes)
    }
}

#[async_trait]
impl DocumentReader for HttpDocumentReader {
    async fn fetch(&self, document: &DocumentRef) -> Result<FetchedDocument, FetchError> {
        let DocumentRef::Url(url) = document else {
            return Err(FetchError::Unsupported(document.to_string()));
        };

        let bytes = self.download(url).await?;
        debug!(url = %url, bytes = bytes.len(), "Document downloaded");
        Ok(FetchedDocument {
            file_name: document.file_name(),
            bytes,
        })
    }
}

/// Reads documents from the local filesystem
pub struct FileDocumentReader {
    limit: SizeLimit,
}

impl FileDocumentReader {
    /// Build a reader that refuses files larger than `limit`
    pub fn new(limit: SizeLimit) -> Self {
        Self { limit }
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, FetchError> {
        let not_found = |e: std::io::Error| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
            _ => FetchError::Transport(format!("{}: {}", path.display(), e)),
        };

        let metadata = tokio::fs::metadata(path).await.map_err(not_found)?;
        if !metadata.is_file() {
            return Err(FetchError::NotFound(path.display().to_string()));
        }
        self.limit.check(metadata.len())?;

        let bytes = tokio::fs::read(path).await.map_err(not_found)?;
        self.limit.check(bytes.len() as u64)?;
        Ok(bytes)
    }
}

#[async_trait]
impl DocumentReader for FileDocumentReader {
    async fn fetch(&self, document: &DocumentRef) -> Result<FetchedDocument, FetchError> {
        let DocumentRef::Path(path) = document else {
            return Err(FetchError::Unsupported(document.to_string()));
        };

        let bytes = self.read(path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Document read");
        Ok(FetchedDocument {
            file_name: document.file_name(),
            bytes,
        })
    }
}

/// Reads local paths from disk and URLs over HTTP
pub struct DefaultDocumentReader {
    http: HttpDocumentReader,
    file: FileDocumentReader,
}

impl DefaultDocumentReader {
    /// Build both readers with a shared size limit
    pub fn new(limit: SizeLimit, fetch_timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpDocumentReader::new(limit, fetch_timeout)?,
            file: FileDocumentReader::new(limit),
        })
    }
}

#[async_trait]
impl DocumentReader for DefaultDocumentReader {
    async fn fetch(&self, document: &DocumentRef) -> Result<FetchedDocument, FetchError> {
        match document {
            DocumentRef::Url(_) => self.http.fetch(document).await,
            DocumentRef::Path(_) => self.file.fetch(document).await,
        }
    }
}

/// Serves documents from memory, keyed by their display form
///
/// Useful for tests and for callers that already hold the document bytes.
#[derive(Default)]
pub struct InMemoryReader {
    documents: HashMap<String, Vec<u8>>,
    limit: Option<SizeLimit>,
}

impl InMemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.documents.insert(reference.into(), bytes.into());
        self
    }

    pub fn with_limit(mut self, limit: SizeLimit) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
impl DocumentReader for InMemoryReader {
    async fn fetch(&self, document: &DocumentRef) -> Result<FetchedDocument, FetchError> {
        let key = document.to_string();
        let bytes = self
            .documents
            .get(&key)
            .ok_or(FetchError::NotFound(key))?;
        if let Some(limit) = self.limit {
            limit.check(bytes.len() as u64)?;
        }
        Ok(FetchedDocument {
            file_name: document.file_name(),
            bytes: bytes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use std::io::Write;
    use std::path::PathBuf;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_size_limit() {
        let limit = SizeLimit::megabytes(1);
        assert!(limit.check(MB).is_ok());
        assert_eq!(
            limit.check(MB + 1),
            Err(FetchError::TooLarge { size: MB + 1, limit_mb: 1 })
        );
    }

    #[tokio::test]
    async fn test_http_download() {
        let base = serve(Router::new().route("/docs/policy.txt", get(|| async { "1 Scope\nNo ads.\n" }))).await;
        let reader = HttpDocumentReader::new(SizeLimit::megabytes(1), Duration::from_secs(5)).unwrap();

        let doc = reader
            .fetch(&DocumentRef::Url(format!("{}/docs/policy.txt", base)))
            .await
            .unwrap();
        assert_eq!(doc.file_name.as_deref(), Some("policy.txt"));
        assert_eq!(doc.bytes, b"1 Scope\nNo ads.\n");
    }

    #[tokio::test]
    async fn test_http_declared_size_over_limit() {
        let big = vec![b'a'; (MB + 10) as usize];
        let base = serve(Router::new().route("/big.txt", get(move || async move { big }))).await;
        let reader = HttpDocumentReader::new(SizeLimit::megabytes(1), Duration::from_secs(5)).unwrap();

        let result = reader.fetch(&DocumentRef::Url(format!("{}/big.txt", base))).await;
        assert!(matches!(result, Err(FetchError::TooLarge { limit_mb: 1, .. })));
    }

    #[tokio::test]
    async fn test_http_missing_document() {
        let base = serve(Router::new()).await;
        let reader = HttpDocumentReader::new(SizeLimit::megabytes(1), Duration::from_secs(5)).unwrap();

        let result = reader.fetch(&DocumentRef::Url(format!("{}/gone.pdf", base))).await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_http_reader_rejects_paths() {
        let reader = HttpDocumentReader::new(SizeLimit::megabytes(1), Duration::from_secs(5)).unwrap();
        let result = reader.fetch(&DocumentRef::Path(PathBuf::from("a.pdf"))).await;
        assert!(matches!(result, Err(FetchError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_file_reader() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"Rules apply.").unwrap();

        let reader = FileDocumentReader::new(SizeLimit::megabytes(1));
        let doc = reader
            .fetch(&DocumentRef::Path(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(doc.bytes, b"Rules apply.");
        assert!(doc.file_name.unwrap().ends_with(".txt"));
    }

    #[tokio::test]
    async fn test_file_reader_size_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![b'x'; (MB + 1) as usize]).unwrap();

        let reader = FileDocumentReader::new(SizeLimit::megabytes(1));
        let result = reader.fetch(&DocumentRef::Path(file.path().to_path_buf())).await;
        assert!(matches!(result, Err(FetchError::TooLarge { .. })));
    }

    #[tokio::test]
    async fn test_file_reader_missing() {
        let reader = FileDocumentReader::new(SizeLimit::megabytes(1));
        let result = reader
            .fetch(&DocumentRef::Path(PathBuf::from("/nonexistent/ruleforge/rules.pdf")))
            .await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_default_reader_dispatches_on_reference() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"local").unwrap();
        let reader = DefaultDocumentReader::new(SizeLimit::megabytes(1), Duration::from_secs(5)).unwrap();

        let doc = reader
            .fetch(&DocumentRef::Path(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(doc.bytes, b"local");

        let result = reader.fetch(&DocumentRef::Url("http://127.0.0.1:9/a.pdf".into())).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
