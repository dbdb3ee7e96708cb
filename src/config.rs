use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use crate::tmdb::TMDB_BASE;

const DEFAULT_FAVORITES_PATH: &str = "data/movieApp_favorites.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3146";

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub favorites_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let tmdb_api_key = optional("TMDB_API_KEY")
            .ok_or_else(|| anyhow::anyhow!("Missing required environment variable: TMDB_API_KEY"))?;
        let tmdb_base_url = optional("TMDB_BASE_URL").unwrap_or_else(|| TMDB_BASE.to_string());
        let favorites_path = optional("FAVORITES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FAVORITES_PATH));
        let bind_raw = optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .with_context(|| format!("BIND_ADDR '{}' is not a socket address", bind_raw))?;

        info!(
            "Config: TMDB at {}, favorites in {}",
            tmdb_base_url,
            favorites_path.display()
        );
        Ok(Self {
            tmdb_api_key,
            tmdb_base_url,
            favorites_path,
            bind_addr,
        })
    }
}
