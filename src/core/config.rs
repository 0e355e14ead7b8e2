//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.waypoint/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::state::{State, empty_state};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WaypointConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub router: RouterConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub pages_dir: Option<PathBuf>,
    pub fragment_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RouterConfig {
    /// TOML table converted to the JSON default state.
    pub default_state: Option<State>,
    /// Top-level state field used as the destination.
    pub route_key: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_PAGES_DIR: &str = "pages";
pub const DEFAULT_FRAGMENT_FILE: &str = "fragment";
pub const DEFAULT_LOG_FILE: &str = "waypoint.log";
pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_ROUTE_KEY: &str = "page";
pub const DEFAULT_START_PAGE: &str = "index";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub pages_dir: PathBuf,
    pub fragment_file: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    pub default_state: State,
    pub route_key: String,
}

/// Settings given on the command line. `None` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub pages_dir: Option<PathBuf>,
    pub fragment_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.waypoint/`.
pub fn waypoint_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".waypoint"))
}

/// Returns the path to `~/.waypoint/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    waypoint_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.waypoint/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `WaypointConfig::default()`.
pub fn load_config() -> Result<WaypointConfig, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            warn!("Could not determine home directory, using default config");
            Ok(WaypointConfig::default())
        }
    }
}

/// Load config from an explicit path, generating a default file if missing.
pub fn load_config_from(path: &Path) -> Result<WaypointConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(WaypointConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: WaypointConfig = toml::from_str(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Waypoint Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# pages_dir = "pages"                 # Markdown pages, one file per destination
# fragment_file = "fragment"          # Relative paths resolve against ~/.waypoint/
# log_file = "waypoint.log"
# log_level = "debug"                 # "error", "warn", "info", "debug", "trace"

# [router]
# route_key = "page"                  # State field used to pick a page
# default_state = { page = "index" }
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &WaypointConfig, cli: &CliOverrides) -> ResolvedConfig {
    let base = waypoint_dir().unwrap_or_else(|| PathBuf::from("."));
    resolve_in(config, cli, &base)
}

/// `resolve`, with relative state paths anchored at `base`.
fn resolve_in(config: &WaypointConfig, cli: &CliOverrides, base: &Path) -> ResolvedConfig {
    // Pages dir: CLI → env → config → default (relative to the working dir)
    let pages_dir = cli
        .pages_dir
        .clone()
        .or_else(|| env_path("WAYPOINT_PAGES_DIR"))
        .or_else(|| config.general.pages_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PAGES_DIR));

    // Fragment file: CLI → env → config → default (relative to ~/.waypoint/)
    let fragment_file = cli
        .fragment_file
        .clone()
        .or_else(|| env_path("WAYPOINT_FRAGMENT_FILE"))
        .or_else(|| config.general.fragment_file.clone())
        .map(|p| anchor_relative(base, p))
        .unwrap_or_else(|| base.join(DEFAULT_FRAGMENT_FILE));

    let log_file = config
        .general
        .log_file
        .clone()
        .map(|p| anchor_relative(base, p))
        .unwrap_or_else(|| base.join(DEFAULT_LOG_FILE));

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("WAYPOINT_LOG_LEVEL").ok())
        .or_else(|| config.general.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let route_key = config
        .router
        .route_key
        .clone()
        .unwrap_or_else(|| DEFAULT_ROUTE_KEY.to_string());

    let default_state = config
        .router
        .default_state
        .clone()
        .unwrap_or_else(|| default_state_for(&route_key));

    ResolvedConfig {
        pages_dir,
        fragment_file,
        log_file,
        log_level,
        default_state,
        route_key,
    }
}

/// `{ <route_key>: "index" }`
fn default_state_for(route_key: &str) -> State {
    let mut state = empty_state();
    if let Some(map) = state.as_object_mut() {
        map.insert(route_key.to_string(), State::from(DEFAULT_START_PAGE));
    }
    state
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from)
}

fn anchor_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config_parses() {
        let config = WaypointConfig::default();
        assert!(config.general.pages_dir.is_none());
        assert!(config.router.default_state.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let config = WaypointConfig::default();
        let resolved = resolve_in(&config, &CliOverrides::default(), Path::new("/base"));
        assert_eq!(resolved.fragment_file, PathBuf::from("/base/fragment"));
        assert_eq!(resolved.log_file, PathBuf::from("/base/waypoint.log"));
        assert_eq!(resolved.route_key, "page");
        assert_eq!(resolved.default_state, json!({"page": "index"}));
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = WaypointConfig {
            general: GeneralConfig {
                pages_dir: Some(PathBuf::from("/srv/wiki")),
                fragment_file: Some(PathBuf::from("state/fragment")),
                log_file: Some(PathBuf::from("/tmp/wp.log")),
                log_level: Some("info".to_string()),
            },
            router: RouterConfig {
                default_state: Some(json!({"section": "intro"})),
                route_key: Some("section".to_string()),
            },
        };
        let resolved = resolve_in(&config, &CliOverrides::default(), Path::new("/base"));
        assert_eq!(resolved.fragment_file, PathBuf::from("/base/state/fragment"));
        assert_eq!(resolved.log_file, PathBuf::from("/tmp/wp.log"));
        assert_eq!(resolved.route_key, "section");
        assert_eq!(resolved.default_state, json!({"section": "intro"}));
    }

    #[test]
    fn test_route_key_shapes_default_state() {
        let config = WaypointConfig {
            router: RouterConfig {
                route_key: Some("view".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_in(&config, &CliOverrides::default(), Path::new("/base"));
        assert_eq!(resolved.default_state, json!({"view": "index"}));
    }

    #[test]
    fn test_resolve_cli_wins() {
        let config = WaypointConfig {
            general: GeneralConfig {
                pages_dir: Some(PathBuf::from("from-config")),
                fragment_file: Some(PathBuf::from("from-config")),
                ..Default::default()
            },
            ..Default::default()
        };
        let cli = CliOverrides {
            pages_dir: Some(PathBuf::from("from-cli")),
            fragment_file: Some(PathBuf::from("/abs/fragment")),
            log_level: Some("trace".to_string()),
        };
        let resolved = resolve_in(&config, &cli, Path::new("/base"));
        assert_eq!(resolved.pages_dir, PathBuf::from("from-cli"));
        assert_eq!(resolved.fragment_file, PathBuf::from("/abs/fragment"));
        assert_eq!(resolved.log_level, "trace");
    }

    #[test]
    fn test_toml_default_state_table() {
        let toml_str = r#"
[general]
pages_dir = "docs"

[router]
route_key = "page"
default_state = { page = "about", filters = { open = true }, tags = ["a", "b"] }
"#;
        let config: WaypointConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.pages_dir, Some(PathBuf::from("docs")));
        assert_eq!(
            config.router.default_state,
            Some(json!({"page": "about", "filters": {"open": true}, "tags": ["a", "b"]}))
        );
    }

    #[test]
    fn test_sparse_toml_parses() {
        let toml_str = r#"
[general]
log_level = "warn"
"#;
        let config: WaypointConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level.as_deref(), Some("warn"));
        assert!(config.general.fragment_file.is_none());
        assert!(config.router.route_key.is_none());
    }

    #[test]
    fn test_missing_config_file_is_generated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = load_config_from(&path).unwrap();
        assert!(config.router.default_state.is_none());
        assert!(path.exists());

        // The generated file is all comments, so it parses back to defaults.
        let reloaded = load_config_from(&path).unwrap();
        assert!(reloaded.general.pages_dir.is_none());
    }

    #[test]
    fn test_malformed_config_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general\npages_dir = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }
}
