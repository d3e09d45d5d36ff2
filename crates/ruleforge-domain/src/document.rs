//! Document references and fetched payloads

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File extensions accepted for extraction
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

/// Where a document comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRef {
    /// A file on the local filesystem
    Path(PathBuf),
    /// An `http` or `https` URL
    Url(String),
}

impl DocumentRef {
    /// Build a reference from user input: anything with an http(s) scheme is a URL
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if is_http_url(trimmed) {
            DocumentRef::Url(trimmed.to_string())
        } else {
            DocumentRef::Path(PathBuf::from(trimmed))
        }
    }

    /// Final path segment of the reference (file name), if any
    pub fn file_name(&self) -> Option<String> {
        match self {
            DocumentRef::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            DocumentRef::Url(url) => url_path(url)
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .map(str::to_string),
        }
    }

    /// Base identifier of the document: file name without its extension
    ///
    /// URLs without a usable path segment fall back to their host.
    pub fn source_id(&self) -> String {
        if let Some(name) = self.file_name() {
            let stem = Path::new(&name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(name);
            if !stem.is_empty() {
                return stem;
            }
        }
        match self {
            DocumentRef::Url(url) => url_host(url).to_string(),
            DocumentRef::Path(_) => "document".to_string(),
        }
    }

    /// Lowercase extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        self.file_name().and_then(|name| {
            Path::new(&name)
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
        })
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRef::Path(path) => write!(f, "{}", path.display()),
            DocumentRef::Url(url) => f.write_str(url),
        }
    }
}

/// True when `input` starts with an `http://` or `https://` scheme and has a host
pub fn is_http_url(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    matches!(rest, Some(r) if !r.is_empty() && !r.starts_with('/'))
}

fn strip_scheme(url: &str) -> &str {
    url.split_once("://").map(|(_, rest)| rest).unwrap_or(url)
}

fn url_host(url: &str) -> &str {
    let rest = strip_scheme(url);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

fn url_path(url: &str) -> &str {
    let rest = strip_scheme(url);
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    match rest.find('/') {
        Some(idx) => &rest[idx..],
        None => "",
    }
}

/// Format of a document's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Portable Document Format
    Pdf,
    /// UTF-8 plain text or Markdown
    Text,
}

impl DocumentKind {
    /// Kind implied by a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" | "md" => Some(DocumentKind::Text),
            _ => None,
        }
    }

    /// Detect the kind from the payload, using the file name as a hint
    ///
    /// The `%PDF` magic wins over any extension; otherwise a known text
    /// extension or valid UTF-8 content means text.
    pub fn detect(bytes: &[u8], file_name: Option<&str>) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            return Some(DocumentKind::Pdf);
        }
        let hinted = file_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| Self::from_extension(&e.to_string_lossy()));
        match hinted {
            Some(DocumentKind::Text) => Some(DocumentKind::Text),
            _ if std::str::from_utf8(bytes).is_ok() => Some(DocumentKind::Text),
            _ => None,
        }
    }

    /// File suffix used for staged copies
    pub fn suffix(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => ".pdf",
            DocumentKind::Text => ".txt",
        }
    }
}

/// Raw bytes returned by a `DocumentReader`
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// File name reported by the source, if known
    pub file_name: Option<String>,
    /// Document payload
    pub bytes: Vec<u8>,
}

impl FetchedDocument {
    /// Size of the payload in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for an empty payload
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
