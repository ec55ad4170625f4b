//! Configuration loading and root folder resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal; it is logged and the
//! remaining tiers are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "BQZIM_ROOT_FOLDER";
/// Environment variable overriding the models directory
pub const ENV_MODELS_DIR: &str = "BQZIM_MODELS_DIR";
/// Environment variable overriding the bind host
pub const ENV_HOST: &str = "BQZIM_HOST";
/// Environment variable overriding the bind port
pub const ENV_PORT: &str = "BQZIM_PORT";
/// Environment variable overriding the upload size limit
pub const ENV_MAX_UPLOAD_BYTES: &str = "BQZIM_MAX_UPLOAD_BYTES";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "bqzim.db";

/// Values compiled into the binary, used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

/// Logging section of the TOML config file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive for tracing-subscriber (e.g. "info", "bqzim_api=debug")
    pub level: Option<String>,
}

/// On-disk TOML configuration; every key is optional
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub models_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub models_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub models_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl ServiceConfig {
    /// Resolve every setting from CLI > ENV > TOML > compiled default
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::for_current_platform();

        let root_folder = resolve_setting(
            cli.root_folder.clone(),
            ENV_ROOT_FOLDER,
            toml.root_folder.clone(),
        )?
        .unwrap_or(defaults.root_folder);

        // Models live next to the database unless pointed elsewhere
        let models_dir = resolve_setting(
            cli.models_dir.clone(),
            ENV_MODELS_DIR,
            toml.models_dir.clone(),
        )?
        .unwrap_or_else(|| root_folder.join("models"));

        let host = resolve_setting(cli.host.clone(), ENV_HOST, toml.host.clone())?
            .unwrap_or(defaults.host);
        let port = resolve_setting(cli.port, ENV_PORT, toml.port)?.unwrap_or(defaults.port);
        let max_upload_bytes =
            resolve_setting(cli.max_upload_bytes, ENV_MAX_UPLOAD_BYTES, toml.max_upload_bytes)?
                .unwrap_or(defaults.max_upload_bytes);

        let log_level = toml.logging.level.clone().unwrap_or(defaults.log_level);

        Ok(Self {
            root_folder,
            models_dir,
            host,
            port,
            max_upload_bytes,
            log_level,
        })
    }

    /// Path of the SQLite database inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    /// "host:port" string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create the root folder if it does not exist yet
    pub fn ensure_root_folder(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }
}

/// Pick the first configured value in priority order
///
/// An environment variable that is set but does not parse is an error
/// rather than a silent fallthrough.
fn resolve_setting<T>(cli: Option<T>, env_var_name: &str, toml: Option<T>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if cli.is_some() {
        return Ok(cli);
    }

    if let Ok(raw) = std::env::var(env_var_name) {
        let value = raw
            .parse::<T>()
            .map_err(|e| Error::Config(format!("{}={:?} is invalid: {}", env_var_name, raw, e)))?;
        return Ok(Some(value));
    }

    Ok(toml)
}

/// Platform config file location, if one exists
///
/// Linux checks the user config dir first, then /etc.
pub fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("bqzim").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/bqzim/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("bqzim"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/bqzim"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("bqzim"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/bqzim"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("bqzim"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\bqzim"))
    } else {
        PathBuf::from("./bqzim_data")
    }
}
