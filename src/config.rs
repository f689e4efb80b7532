//! Server configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `TABLETOPD_*` environment variables. CLI flags override all three
//! in `main`.

use std::net::SocketAddr;
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address to listen on
    pub bind_addr: SocketAddr,
    /// SQLite database file; in-memory when unset
    pub db_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            db_path: None,
        }
    }
}

impl Config {
    /// Load configuration, optionally merging a TOML file under the
    /// defaults and `TABLETOPD_*` environment variables on top.
    pub fn load(file: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("TABLETOPD_")).extract()
    }
}
