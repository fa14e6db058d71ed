//! Configuration loading and resolution
//!
//! Every setting resolves through the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default vPIC endpoint serving the vehicle catalog
pub const DEFAULT_BASE_URL: &str = "https://vpic.nhtsa.dot.gov/api/vehicles";

/// Default port for the read-only query API
pub const DEFAULT_API_PORT: u16 = 5780;

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite catalog database
    pub database_path: PathBuf,
    /// Base URL of the upstream vehicle catalog API
    pub base_url: String,
    /// Port the query API listens on
    pub api_port: u16,
    /// Log level filter (debug, info, warn, error)
    pub log_level: String,
}

/// Per-binary overrides collected from the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub api_port: Option<u16>,
}

/// Optional settings as they appear in the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    database_path: Option<PathBuf>,
    base_url: Option<String>,
    api_port: Option<u16>,
    log_level: Option<String>,
}

impl Config {
    /// Resolve the full configuration from CLI overrides, environment,
    /// config file, and defaults.
    pub fn resolve(overrides: Overrides) -> Result<Config> {
        let file = load_file_config(overrides.config_file.as_deref())?;

        let database_path = overrides
            .database_path
            .or_else(|| std::env::var("VCAT_DATABASE").ok().map(PathBuf::from))
            .or(file.database_path)
            .unwrap_or_else(default_database_path);

        let base_url = overrides
            .base_url
            .or_else(|| std::env::var("VCAT_BASE_URL").ok())
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_port = match overrides
            .api_port
            .map(Ok)
            .or_else(|| std::env::var("VCAT_API_PORT").ok().map(|v| v.parse()))
        {
            Some(Ok(port)) => port,
            Some(Err(e)) => {
                return Err(Error::Config(format!("Invalid VCAT_API_PORT: {}", e)));
            }
            None => file.api_port.unwrap_or(DEFAULT_API_PORT),
        };

        let log_level = std::env::var("VCAT_LOG")
            .ok()
            .or(file.log_level)
            .unwrap_or_else(|| "info".to_string());

        match log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(Error::Config(format!("Unknown log level: '{}'", other)));
            }
        }

        // Trailing slash would double up when joining endpoint paths
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Config {
            database_path,
            base_url,
            api_port,
            log_level,
        })
    }
}

/// Load the TOML config file, if one exists.
///
/// An explicitly named file must exist and parse; the conventional
/// locations are optional.
fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match find_config_file() {
            Some(path) => path,
            None => return Ok(FileConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Look for a config file in the conventional platform locations
fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("VCAT_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("vcat").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/vcat/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Platform default location of the catalog database
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vcat"))
        .unwrap_or_else(|| PathBuf::from("./vcat_data"))
        .join("catalog.db")
}
