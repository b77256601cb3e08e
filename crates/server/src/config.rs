use std::{num::NonZeroUsize, path::PathBuf};

use services::services::profile::DEFAULT_PICTURE_COLLECTION;
use thiserror::Error;
use url::Url;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_URL: &str = "sqlite://profile.db?mode=rwc";
const DEFAULT_BLOB_ROOT: &str = "./blobs";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_MOUNTED_PAGES: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error("{0} must be set when BLOB_BACKEND=http")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobBackend {
    /// Files under `root`, served by this server at `/assets`.
    Local { root: PathBuf },
    /// Remote object store accepting `PUT` uploads.
    Http { endpoint: Url },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub blob_backend: BlobBackend,
    /// Base of the URLs handed out for stored pictures.
    pub blob_public_url: Url,
    pub picture_collection: String,
    pub max_upload_bytes: usize,
    /// Profile pages kept in memory before the least recently used is dropped.
    pub max_mounted_pages: NonZeroUsize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                message: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

        let blob_backend = match var("BLOB_BACKEND").as_deref().unwrap_or("local") {
            "local" => BlobBackend::Local {
                root: PathBuf::from(var("BLOB_ROOT").unwrap_or_else(|| DEFAULT_BLOB_ROOT.into())),
            },
            "http" => {
                let raw = var("BLOB_ENDPOINT").ok_or(ConfigError::Missing("BLOB_ENDPOINT"))?;
                BlobBackend::Http {
                    endpoint: parse_url("BLOB_ENDPOINT", &raw)?,
                }
            }
            other => {
                return Err(ConfigError::Invalid {
                    key: "BLOB_BACKEND",
                    message: format!("unknown backend '{other}', expected local or http"),
                });
            }
        };

        let blob_public_url = match var("BLOB_PUBLIC_URL") {
            Some(raw) => parse_url("BLOB_PUBLIC_URL", &raw)?,
            None => match &blob_backend {
                BlobBackend::Local { .. } => {
                    parse_url("BLOB_PUBLIC_URL", &format!("http://{host}:{port}/assets/"))?
                }
                BlobBackend::Http { endpoint } => endpoint.clone(),
            },
        };

        let picture_collection = var("PROFILE_PICTURE_COLLECTION")
            .unwrap_or_else(|| DEFAULT_PICTURE_COLLECTION.to_owned());

        let max_upload_bytes = match var("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
                key: "MAX_UPLOAD_BYTES",
                message: e.to_string(),
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let max_mounted_pages = var("MAX_MOUNTED_PAGES")
            .map(|raw| raw.parse::<usize>().map_err(|e| e.to_string()))
            .unwrap_or(Ok(DEFAULT_MAX_MOUNTED_PAGES))
            .and_then(|n| NonZeroUsize::new(n).ok_or_else(|| "must be at least 1".to_owned()))
            .map_err(|message| ConfigError::Invalid {
                key: "MAX_MOUNTED_PAGES",
                message,
            })?;

        Ok(Self {
            host,
            port,
            database_url,
            blob_backend,
            blob_public_url,
            picture_collection,
            max_upload_bytes,
            max_mounted_pages,
        })
    }

    /// Directory to serve under `/assets`, when blobs are stored locally.
    pub fn local_blob_root(&self) -> Option<&PathBuf> {
        match &self.blob_backend {
            BlobBackend::Local { root } => Some(root),
            BlobBackend::Http { .. } => None,
        }
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}
