//! Configuration for the save hook.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CUSTOM_SAVE_HOME, CUSTOM_SAVE_SETTINGS)
//! 2. Config file (.custom-save/config.yaml)
//! 3. Defaults (~/.custom-save, settings.json, markdown extension "md")
//!
//! Config file discovery:
//! - Searches current directory and parents for .custom-save/config.yaml
//! - Paths in the config file are relative to the .custom-save/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::ExternalFilter;
use crate::core::MARKDOWN_EXTENSION;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".custom-save";
const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    /// Hook home (relative to the config directory)
    #[serde(default)]
    pub home: Option<String>,
    /// Settings file (relative to the config directory)
    #[serde(default)]
    pub settings_file: Option<String>,
    /// Extension the save hook applies to
    #[serde(default)]
    pub markdown_extension: Option<String>,
    /// External filters registered as editor actions
    #[serde(default)]
    pub actions: Vec<ExternalFilter>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Home directory for hook state
    pub home: PathBuf,
    /// Where the selected action list is persisted
    pub settings_file: PathBuf,
    /// Extension the save hook applies to (no leading dot)
    pub markdown_extension: String,
    /// External filters declared in the config file
    pub filters: Vec<ExternalFilter>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = serde_yaml::from_str(content)?;

    let mut seen = std::collections::HashSet::new();
    for filter in &config.actions {
        if filter.id.trim().is_empty() {
            anyhow::bail!("Action with command '{}' has an empty id", filter.command);
        }
        if !seen.insert(filter.id.as_str()) {
            anyhow::bail!("Action '{}' is declared more than once", filter.id);
        }
    }

    Ok(config)
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Values taken from `CUSTOM_SAVE_HOME` and `CUSTOM_SAVE_SETTINGS`
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    home: Option<PathBuf>,
    settings_file: Option<PathBuf>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            home: std::env::var("CUSTOM_SAVE_HOME").ok().map(PathBuf::from),
            settings_file: std::env::var("CUSTOM_SAVE_SETTINGS").ok().map(PathBuf::from),
        }
    }
}

/// Load configuration from all sources, searching from `start`
fn load_config_from(start: &Path, env: EnvOverrides) -> Result<ResolvedConfig> {
    let config_file = find_config_file(start);

    let (home, settings_file, markdown_extension, filters) = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Relative paths are anchored at .custom-save/
        let config_dir = config_path.parent().unwrap_or(Path::new("."));

        let home = if let Some(env_home) = env.home {
            env_home
        } else if let Some(ref home_path) = config.home {
            resolve_path(config_dir, home_path)
        } else {
            config_dir.to_path_buf()
        };

        let settings_file = if let Some(env_settings) = env.settings_file {
            env_settings
        } else if let Some(ref settings_path) = config.settings_file {
            resolve_path(config_dir, settings_path)
        } else {
            home.join(DEFAULT_SETTINGS_FILE)
        };

        let markdown_extension = config
            .markdown_extension
            .map(|ext| ext.trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| MARKDOWN_EXTENSION.to_string());

        (home, settings_file, markdown_extension, config.actions)
    } else {
        let home = match env.home {
            Some(home) => home,
            None => dirs::home_dir()
                .context("Failed to determine home directory")?
                .join(CONFIG_DIR),
        };
        let settings_file = env
            .settings_file
            .unwrap_or_else(|| home.join(DEFAULT_SETTINGS_FILE));
        (home, settings_file, MARKDOWN_EXTENSION.to_string(), Vec::new())
    };

    Ok(ResolvedConfig {
        home,
        settings_file,
        markdown_extension,
        filters,
        config_file,
    })
}

fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd, EnvOverrides::from_env())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
