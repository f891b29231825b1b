// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Text loaders for region geometry and point overlay files.
//!
//! Loads are one-shot: no retries and no timeouts. A failed load is
//! reported to the caller and the attempt ends there.

use std::future::Future;
use std::path::{Component, Path, PathBuf};

/// Fetch a text document by relative path.
pub trait SourceLoader {
    fn load_text(&self, path: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Loads files from a local data directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path);
        // Sources are always relative to the data directory
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl SourceLoader for FsLoader {
    async fn load_text(&self, path: &str) -> Result<String, FetchError> {
        let full = self.resolve(path)?;
        tracing::debug!(path = %full.display(), "Reading source file");
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| FetchError::Io {
                path: path.to_string(),
                message: e.to_string(),
            })
    }
}

/// Loads files over HTTP relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLoader {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl SourceLoader for HttpLoader {
    async fn load_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url_for(path);
        tracing::debug!(url = %url, "Fetching source");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Http {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Http {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// Loader selected by configuration.
#[derive(Debug, Clone)]
pub enum Loader {
    Fs(FsLoader),
    Http(HttpLoader),
}

impl SourceLoader for Loader {
    async fn load_text(&self, path: &str) -> Result<String, FetchError> {
        match self {
            Loader::Fs(l) => l.load_text(path).await,
            Loader::Http(l) => l.load_text(path).await,
        }
    }
}

/// Errors from source loading.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to fetch {path}: {message}")]
    Http { path: String, message: String },

    #[error("Fetching {path} returned HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("Invalid source path: {0}")]
    InvalidPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_loader_rejects_escaping_paths() {
        let loader = FsLoader::new("data");
        assert!(matches!(
            loader.resolve("../secrets.txt"),
            Err(FetchError::InvalidPath(_))
        ));
        assert!(matches!(
            loader.resolve("/etc/passwd"),
            Err(FetchError::InvalidPath(_))
        ));
        assert_eq!(
            loader.resolve("KMLs/Austin.kml").unwrap(),
            PathBuf::from("data/KMLs/Austin.kml")
        );
    }

    #[test]
    fn test_http_loader_url_join() {
        let loader = HttpLoader::new("http://localhost:9000/static/");
        assert_eq!(
            loader.url_for("/KMLs/Austin.kml"),
            "http://localhost:9000/static/KMLs/Austin.kml"
        );
    }

    #[tokio::test]
    async fn test_fs_loader_missing_file() {
        let loader = FsLoader::new("does-not-exist");
        let result = loader.load_text("nothing.kml").await;
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }
}
