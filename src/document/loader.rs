//! Document loading: fetch PDF bytes and extract page-level text.

use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Errors raised while loading a source document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// HTTP fetch of the document failed before a response arrived.
    #[error("Failed to fetch document {uri}: {source}")]
    Fetch {
        /// URI of the document being fetched.
        uri: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// Document host responded with a non-success status.
    #[error("Document fetch for {uri} returned {status}")]
    UnexpectedStatus {
        /// URI of the document being fetched.
        uri: String,
        /// HTTP status returned by the host.
        status: StatusCode,
    },
    /// Local file read failed.
    #[error("Failed to read document {path}: {source}")]
    Read {
        /// Path of the document on disk.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Byte payload could not be parsed as a PDF.
    #[error("Failed to parse PDF {uri}: {source}")]
    Parse {
        /// URI or path of the malformed document.
        uri: String,
        /// Underlying extraction error.
        #[source]
        source: pdf_extract::OutputError,
    },
}

/// Text extracted from a single page of a source document.
#[derive(Debug, Clone)]
pub struct PageText {
    /// Zero-based page number within the source document.
    pub page: usize,
    /// Raw text content of the page.
    pub text: String,
}

/// Loader that resolves a document URI into page-level text.
///
/// `http(s)` URIs are fetched over the network; anything else is treated as a
/// local filesystem path. Parsing is delegated to `pdf-extract`.
pub struct PdfLoader {
    client: Client,
}

impl PdfLoader {
    /// Construct a loader with a default HTTP client.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Load a document and return one text unit per page.
    ///
    /// A zero-page or empty document yields an empty vector, not an error.
    pub async fn load_pages(&self, uri: &str) -> Result<Vec<PageText>, LoadError> {
        let bytes = self.resolve_bytes(uri).await?;
        parse_pages(&bytes, uri)
    }

    async fn resolve_bytes(&self, uri: &str) -> Result<Vec<u8>, LoadError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            let response = self
                .client
                .get(uri)
                .send()
                .await
                .map_err(|source| LoadError::Fetch {
                    uri: uri.to_string(),
                    source,
                })?;

            if !response.status().is_success() {
                return Err(LoadError::UnexpectedStatus {
                    uri: uri.to_string(),
                    status: response.status(),
                });
            }

            let bytes = response.bytes().await.map_err(|source| LoadError::Fetch {
                uri: uri.to_string(),
                source,
            })?;
            Ok(bytes.to_vec())
        } else {
            tokio::fs::read(uri).await.map_err(|source| LoadError::Read {
                path: uri.to_string(),
                source,
            })
        }
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an in-memory PDF payload into per-page text units.
pub(crate) fn parse_pages(bytes: &[u8], uri: &str) -> Result<Vec<PageText>, LoadError> {
    let pages =
        pdf_extract::extract_text_by_pages_from_mem(bytes).map_err(|source| LoadError::Parse {
            uri: uri.to_string(),
            source,
        })?;

    tracing::debug!(uri, pages = pages.len(), "Extracted document pages");
    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(page, text)| PageText { page, text })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_rejects_non_pdf_bytes() {
        let error = parse_pages(b"this is not a pdf", "garbage.pdf").expect_err("parse failure");
        assert!(matches!(error, LoadError::Parse { .. }));
        assert!(error.to_string().contains("garbage.pdf"));
    }

    #[tokio::test]
    async fn load_reports_missing_local_file() {
        let loader = PdfLoader::new();
        let error = loader
            .load_pages("/nonexistent/doc.pdf")
            .await
            .expect_err("missing file");
        assert!(matches!(error, LoadError::Read { .. }));
    }

    #[tokio::test]
    async fn load_reports_corrupt_local_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"not a pdf at all").expect("write");

        let loader = PdfLoader::new();
        let error = loader
            .load_pages(file.path().to_str().expect("utf-8 path"))
            .await
            .expect_err("corrupt file");
        assert!(matches!(error, LoadError::Parse { .. }));
    }

    #[tokio::test]
    async fn load_reports_http_error_status() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/doc.pdf");
                then.status(404);
            })
            .await;

        let loader = PdfLoader::new();
        let error = loader
            .load_pages(&format!("{}/doc.pdf", server.base_url()))
            .await
            .expect_err("404 fetch");
        assert!(matches!(error, LoadError::UnexpectedStatus { .. }));
    }
}
