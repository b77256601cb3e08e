//! Path-addressed storage for uploaded binary assets (profile pictures).

use std::{
    fmt,
    path::PathBuf,
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("invalid blob path segment '{0}'")]
    InvalidPath(String),
    #[error("blob {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("url error: {0}")]
    Url(String),
}

/// Location of a blob, always `<collection>/<owner>/<file name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath {
    segments: [String; 3],
}

impl BlobPath {
    pub fn new(collection: &str, owner: &str, file_name: &str) -> Result<Self, BlobStoreError> {
        for segment in [collection, owner, file_name] {
            validate_segment(segment)?;
        }
        Ok(Self {
            segments: [collection.to_owned(), owner.to_owned(), file_name.to_owned()],
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn file_name(&self) -> &str {
        &self.segments[2]
    }

    fn to_relative_path(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn validate_segment(segment: &str) -> Result<(), BlobStoreError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0'])
    {
        return Err(BlobStoreError::InvalidPath(segment.to_owned()));
    }
    Ok(())
}

/// Appends the blob path to `base` as percent-encoded path segments.
pub fn blob_url(base: &Url, path: &BlobPath) -> Result<Url, BlobStoreError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BlobStoreError::Url(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(path.segments());
    Ok(url)
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at `path`, replacing any previous content.
    async fn put(&self, path: &BlobPath, bytes: Bytes) -> Result<(), BlobStoreError>;

    /// Returns a URL the browser can fetch the stored blob from.
    async fn url(&self, path: &BlobPath) -> Result<String, BlobStoreError>;
}

/// Blobs kept on the local filesystem and served by the server under
/// `public_base`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: Url,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base: Url) -> Self {
        Self {
            root: root.into(),
            public_base,
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, path: &BlobPath, bytes: Bytes) -> Result<(), BlobStoreError> {
        let target = self.root.join(path.to_relative_path());
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &bytes).await?;
        tracing::debug!(blob = %path, size = bytes.len(), "stored blob on disk");
        Ok(())
    }

    async fn url(&self, path: &BlobPath) -> Result<String, BlobStoreError> {
        let target = self.root.join(path.to_relative_path());
        if !tokio::fs::try_exists(&target).await? {
            return Err(BlobStoreError::NotFound(path.to_string()));
        }
        Ok(blob_url(&self.public_base, path)?.to_string())
    }
}

/// Blobs kept in an HTTP object store that accepts `PUT` uploads at
/// `endpoint/<path>` and serves them from `public_base/<path>`.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    endpoint: Url,
    public_base: Url,
    http: Client,
}

impl HttpBlobStore {
    pub fn new(endpoint: Url, public_base: Url) -> Result<Self, BlobStoreError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("profile-blob-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BlobStoreError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint,
            public_base,
            http,
        })
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, path: &BlobPath, bytes: Bytes) -> Result<(), BlobStoreError> {
        let url = blob_url(&self.endpoint, path)?;
        let content_type = mime_guess::from_path(path.file_name()).first_or_octet_stream();
        let res = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type.as_ref())
            .body(bytes)
            .send()
            .await
            .map_err(|e| BlobStoreError::Transport(e.to_string()))?;

        if res.status().is_success() {
            return Ok(());
        }
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Err(BlobStoreError::Http { status, body })
    }

    async fn url(&self, path: &BlobPath) -> Result<String, BlobStoreError> {
        let res = self
            .http
            .head(blob_url(&self.endpoint, path)?)
            .send()
            .await
            .map_err(|e| BlobStoreError::Transport(e.to_string()))?;

        match res.status() {
            s if s.is_success() => Ok(blob_url(&self.public_base, path)?.to_string()),
            StatusCode::NOT_FOUND => Err(BlobStoreError::NotFound(path.to_string())),
            s => Err(BlobStoreError::Http {
                status: s.as_u16(),
                body: String::new(),
            }),
        }
    }
}
