//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.paramon/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::LogLevel;
use crate::protocol::{EndpointPaths, PollSettings};
use crate::protocol::backoff::{DEFAULT_MAX_BACKOFF, DEFAULT_POLL_INTERVAL};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ParamonConfig {
    #[serde(default)]
    pub pipes: PipesConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub hotkeys: HotkeysConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PipesConfig {
    pub inbound: Option<PathBuf>,
    pub outbound: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PollingConfig {
    pub interval_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ClipboardConfig {
    pub settle_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HotkeysConfig {
    pub navigation: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    pub level: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_CLIPBOARD_SETTLE_MS: u64 = 50;
pub const DEFAULT_LOG_FILE_NAME: &str = "paramon.log";

// ============================================================================
// CLI overrides (None = flag not given)
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub inbound: Option<PathBuf>,
    pub outbound: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
    pub disable_navigation_hotkeys: bool,
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoints: EndpointPaths,
    pub poll: PollSettings,
    pub clipboard_settle: Duration,
    pub navigation_hotkeys: bool,
    pub log_file: PathBuf,
    pub log_level: LogLevel,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.paramon/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".paramon"))
}

/// Returns the path to `~/.paramon/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `explicit` if given, otherwise `~/.paramon/config.toml`.
///
/// A missing default file is generated (commented out) and defaults are used.
/// A missing explicit file is an error. A malformed file is `ConfigError::Parse`.
pub fn load_config(explicit: Option<&Path>) -> Result<ParamonConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine home directory, using default config");
                return Ok(ParamonConfig::default());
            }
        },
    };

    if explicit.is_none() && !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(ParamonConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config = parse_config(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<ParamonConfig, ConfigError> {
    toml::from_str(contents).map_err(ConfigError::Parse)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Paramon Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [pipes]
# inbound = "/tmp/python_to_swift"     # Or PARAMON_INBOUND_PIPE / --inbound
# outbound = "/tmp/swift_to_python"    # Or PARAMON_OUTBOUND_PIPE / --outbound

# [polling]
# interval_ms = 100                    # Sleep after an empty read or missing endpoint
# max_backoff_ms = 100                 # Sleeps double up to this ceiling

# [clipboard]
# settle_ms = 50                       # Wait before reading the clipboard after Cmd/Ctrl+C

# [hotkeys]
# navigation = true                    # Alt/Option + arrows send navigation requests

# [logging]
# file = "/absolute/path/paramon.log"  # Or --log-file
# level = "debug"                      # "error", "warn", "info", "debug", "trace"
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
pub fn resolve(config: &ParamonConfig, cli: &CliOverrides) -> ResolvedConfig {
    let defaults = EndpointPaths::default();

    // Pipes: CLI → env → config → default
    let inbound = cli
        .inbound
        .clone()
        .or_else(|| env_path("PARAMON_INBOUND_PIPE"))
        .or_else(|| config.pipes.inbound.clone())
        .unwrap_or(defaults.inbound);
    let outbound = cli
        .outbound
        .clone()
        .or_else(|| env_path("PARAMON_OUTBOUND_PIPE"))
        .or_else(|| config.pipes.outbound.clone())
        .unwrap_or(defaults.outbound);

    let interval = config
        .polling
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_POLL_INTERVAL);
    let max_backoff = config
        .polling
        .max_backoff_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_MAX_BACKOFF);

    // Hotkeys: the CLI can only switch them off
    let navigation_hotkeys =
        !cli.disable_navigation_hotkeys && config.hotkeys.navigation.unwrap_or(true);

    // Log file: CLI → config → ~/.paramon/paramon.log → ./paramon.log
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| config.logging.file.clone())
        .or_else(|| config_dir().map(|d| d.join(DEFAULT_LOG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_NAME));

    // Log level: CLI → config → default
    let log_level = cli.log_level.unwrap_or_else(|| {
        config
            .logging
            .level
            .as_deref()
            .and_then(|name| {
                let level = LogLevel::from_name(name);
                if level.is_none() {
                    warn!("Unknown log level {:?} in config, using default", name);
                }
                level
            })
            .unwrap_or_default()
    });

    ResolvedConfig {
        endpoints: EndpointPaths { inbound, outbound },
        poll: PollSettings {
            interval,
            max_backoff,
        },
        clipboard_settle: Duration::from_millis(
            config
                .clipboard
                .settle_ms
                .unwrap_or(DEFAULT_CLIPBOARD_SETTLE_MS),
        ),
        navigation_hotkeys,
        log_file,
        log_level,
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
