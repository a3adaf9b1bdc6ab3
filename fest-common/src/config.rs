//! Configuration loading and root folder resolution
//!
//! Root folder resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `FESTSYNC_ROOT` environment variable
//! 3. `root_folder` key of the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable config file is never fatal: it is logged and defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable that overrides the root folder
pub const ROOT_FOLDER_ENV: &str = "FESTSYNC_ROOT";

/// Default database file name inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "festsync.db";

/// Config file name searched in the platform config directories
pub const CONFIG_FILE_NAME: &str = "festsync.toml";

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of `festsync.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub database_file: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Database file name, falling back to [`DEFAULT_DATABASE_FILE`]
    pub fn database_file(&self) -> &str {
        self.database_file
            .as_deref()
            .unwrap_or(DEFAULT_DATABASE_FILE)
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Locate the config file for the current platform
///
/// Linux checks `~/.config/festsync/festsync.toml` then `/etc/festsync/festsync.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("festsync").join(CONFIG_FILE_NAME));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/festsync").join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Compiled defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: default_log_level(),
        }
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/festsync
        dirs::data_local_dir()
            .map(|d| d.join("festsync"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/festsync"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("festsync"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/festsync"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("festsync"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\festsync"))
    } else {
        PathBuf::from("./festsync_data")
    }
}

/// Resolves the root folder following the documented priority order
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            config_path: None,
        }
    }

    /// Command-line override
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Explicit config file instead of the platform search path
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Load the TOML config this resolver would consult, or defaults if absent
    pub fn load_config(&self) -> TomlConfig {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => match default_config_path() {
                Ok(path) => path,
                Err(_) => {
                    debug!(module = %self.module_name, "No config file found, using defaults");
                    return TomlConfig::default();
                }
            },
        };

        match load_toml_config(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    module = %self.module_name,
                    path = %path.display(),
                    error = %e,
                    "Config file unusable, using defaults"
                );
                TomlConfig::default()
            }
        }
    }

    /// Root folder, loading the TOML config only if CLI and ENV are silent
    pub fn resolve(&self) -> PathBuf {
        self.override_root()
            .or_else(|| self.load_config().root_folder)
            .unwrap_or_else(|| CompiledDefaults::for_current_platform().root_folder)
    }

    /// Root folder using a config the caller already loaded
    pub fn resolve_with(&self, config: &TomlConfig) -> PathBuf {
        self.override_root()
            .or_else(|| config.root_folder.clone())
            .unwrap_or_else(|| CompiledDefaults::for_current_platform().root_folder)
    }

    fn override_root(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        match std::env::var(ROOT_FOLDER_ENV) {
            Ok(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
            _ => None,
        }
    }
}

/// Creates the root folder and derives paths inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
    database_file: String,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self {
            root_folder,
            database_file: DEFAULT_DATABASE_FILE.to_string(),
        }
    }

    pub fn with_database_file(mut self, file: &str) -> Self {
        self.database_file = file.to_string();
        self
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            debug!(path = %self.root_folder.display(), "Created root folder");
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(&self.database_file)
    }
}
