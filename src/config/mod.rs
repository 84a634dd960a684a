//! Configuration module for the members backend.
//!
//! Configuration comes from `MEMBERS_*` environment variables (and `.env`).
//! Everything is validated before the server touches the database.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_DB_PATH: &str = "./data/members.sqlite";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MEMBERS_BIND_ADDR is not a socket address: {0}")]
    InvalidBindAddr(String),

    #[error("MEMBERS_DB_PATH must not be empty")]
    EmptyDbPath,

    #[error("MEMBERS_DB_PATH points to a directory: {}", .0.display())]
    DbPathIsDirectory(PathBuf),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication; unset disables auth
    pub api_psk: Option<String>,
    /// SQLite file holding users, roles, memberships and profiles
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup. Blank values count
    /// as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let db_path: PathBuf = match lookup("MEMBERS_DB_PATH") {
            Some(path) if path.trim().is_empty() => return Err(ConfigError::EmptyDbPath),
            Some(path) => path.trim().into(),
            None => DEFAULT_DB_PATH.into(),
        };
        if db_path.is_dir() {
            return Err(ConfigError::DbPathIsDirectory(db_path));
        }

        let bind_addr = var("MEMBERS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr))?;

        Ok(Self {
            api_psk: var("MEMBERS_API_PSK"),
            db_path,
            bind_addr,
            log_level: var("MEMBERS_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}
