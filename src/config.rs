//! Application configuration loaded from environment variables.
//!
//! Everything has a local-development default; a `.env` file is read if
//! present.

use crate::services::loader::{FsLoader, HttpLoader, Loader};
use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the KML files, the points file and the catalog
    pub data_dir: PathBuf,
    /// Catalog of regions, metrics and color presets
    pub catalog_path: PathBuf,
    /// Address the viewer host binds to (local only by default)
    pub bind_addr: String,
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Color preset name; the catalog default when unset
    pub color_preset: Option<String>,
    /// Fetch sources over HTTP from this base URL instead of `data_dir`
    pub source_base_url: Option<String>,
    /// Shared `*_range` query string restored at startup
    pub share_query: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            catalog_path: PathBuf::from("data/catalog.json"),
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            color_preset: None,
            source_base_url: None,
            share_query: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let catalog_path = env::var("CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("catalog.json"));

        let port = match env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            data_dir,
            catalog_path,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            color_preset: non_empty_var("COLOR_PRESET"),
            source_base_url: non_empty_var("SOURCE_BASE_URL"),
            share_query: non_empty_var("SHARE_QUERY"),
        })
    }

    /// Loader for region and point files.
    pub fn loader(&self) -> Loader {
        match &self.source_base_url {
            Some(url) => Loader::Http(HttpLoader::new(url)),
            None => Loader::Fs(FsLoader::new(&self.data_dir)),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
