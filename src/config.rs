//! Runtime configuration loaded from environment variables
//!
//! # Environment Variables
//!
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Server port number (default: 8080)
//! - `DATA_DIR` - Directory holding the flat-text tables (default: "data")
//! - `AUTHORIZATION` - Shared secret for admin routes (optional)

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            data_dir: PathBuf::from("data"),
            admin_token: None,
        }
    }
}

impl Config {
    /// Reads the configuration, falling back to defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = match env::var("HOST") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid("HOST".to_string(), value))?,
            Err(_) => defaults.host,
        };
        let port = match env::var("PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT".to_string(), value))?,
            Err(_) => defaults.port,
        };
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let admin_token = env::var("AUTHORIZATION")
            .ok()
            .filter(|token| !token.is_empty());

        Ok(Self {
            host,
            port,
            data_dir,
            admin_token,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
