pub(crate) mod duration;

use crate::error::config::ConfigError;
use crate::{DEFAULT_SOCKET_PATH, WMEDIUMD_BINARY};

use common::ErrorLocation;
use models::{InterfaceRef, MediumMode};

use std::collections::HashSet;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "wmediumd-connector.toml";
const CONFIG_DIR_NAME: &str = "wmediumd-connector";
const CONFIG_VERSION: u32 = 1;
const MAX_LOG_LEVEL: u8 = 7;

// ============================================
// CONFIG STRUCTS
// ============================================

/// Settings for starting (or refusing to start) the wmediumd server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Spawn wmediumd when no process of that name is running.
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
    #[serde(default = "default_executable")]
    pub executable: String,
    /// wmediumd `-l` log level, 0-7.
    #[serde(default = "default_log_level")]
    pub log_level: u8,
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Leave a spawned server running after disconnect.
    #[serde(default = "default_keep_server_running")]
    pub keep_server_running: bool,
    #[serde(default = "default_load_hwsim_module")]
    pub load_hwsim_module: bool,
    #[serde(default = "default_startup_timeout", with = "duration")]
    pub startup_timeout: Duration,
    /// Time between SIGINT and SIGKILL when stopping an owned server.
    #[serde(default = "default_stop_grace", with = "duration")]
    pub stop_grace: Duration,
    /// Packet error rate table passed with `-x` in SNR mode.
    #[serde(default)]
    pub per_table: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            auto_start: default_auto_start(),
            executable: default_executable(),
            log_level: default_log_level(),
            extra_args: Vec::new(),
            keep_server_running: default_keep_server_running(),
            load_hwsim_module: default_load_hwsim_module(),
            startup_timeout: default_startup_timeout(),
            stop_grace: default_stop_grace(),
            per_table: None,
        }
    }
}

/// A configured SNR link between two interfaces, referenced by identifier
/// (`"<station>.<interface>"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredSnrLink {
    pub from: String,
    pub to: String,
    pub snr: i32,
}

/// A configured error probability link, referenced by interface identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredErrorProbLink {
    pub from: String,
    pub to: String,
    pub errprob: f64,
}

/// Initial medium the spawned server is started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediumConfig {
    #[serde(default)]
    pub interfaces: Vec<InterfaceRef>,
    #[serde(default)]
    pub snr_links: Vec<ConfiguredSnrLink>,
    #[serde(default)]
    pub errprob_links: Vec<ConfiguredErrorProbLink>,
    /// Complete every missing ordered interface pair with the default value.
    #[serde(default = "default_auto_add_links")]
    pub auto_add_links: bool,
    #[serde(default = "default_auto_snr")]
    pub default_auto_snr: i32,
    #[serde(default = "default_auto_errprob")]
    pub default_auto_errprob: f64,
}

impl Default for MediumConfig {
    fn default() -> Self {
        Self {
            interfaces: Vec::new(),
            snr_links: Vec::new(),
            errprob_links: Vec::new(),
            auto_add_links: default_auto_add_links(),
            default_auto_snr: default_auto_snr(),
            default_auto_errprob: default_auto_errprob(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    #[serde(default)]
    pub mode: MediumMode,

    #[serde(default = "default_connect_timeout", with = "duration")]
    pub connect_timeout: Duration,

    #[serde(default = "default_operation_timeout", with = "duration")]
    pub operation_timeout: Duration,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub medium: MediumConfig,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            socket_path: default_socket_path(),
            mode: MediumMode::default(),
            connect_timeout: default_connect_timeout(),
            operation_timeout: default_operation_timeout(),
            server: ServerConfig::default(),
            medium: MediumConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_socket_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_PATH)
}
fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}
fn default_operation_timeout() -> Duration {
    Duration::from_secs(5)
}
fn default_auto_start() -> bool {
    true
}
fn default_executable() -> String {
    WMEDIUMD_BINARY.to_string()
}
fn default_log_level() -> u8 {
    5
}
fn default_keep_server_running() -> bool {
    true
}
fn default_load_hwsim_module() -> bool {
    true
}
fn default_startup_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_stop_grace() -> Duration {
    Duration::from_millis(500)
}
fn default_auto_add_links() -> bool {
    true
}
fn default_auto_snr() -> i32 {
    -10
}
fn default_auto_errprob() -> f64 {
    1.0
}

/// Default directory holding [`CONFIG_FILE_NAME`], `$XDG_CONFIG_HOME/wmediumd-connector`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME))
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ConnectorConfig {
    /// Config that only attaches to an already running server at `socket_path`.
    pub fn attach(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            server: ServerConfig {
                auto_start: false,
                ..ServerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Load config from `path`, JSON when the extension is `.json`, TOML otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: ConnectorConfig = if is_json {
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        config.validate()?;

        info!("Connector config loaded from {}", path.display());
        Ok(config)
    }

    /// Load `{config_dir}/wmediumd-connector.toml`, or defaults when it does not exist.
    ///
    /// # Returns
    ///
    /// Returns `Ok(ConnectorConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load_or_default(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        Self::load(&config_path).inspect_err(|e| warn!("Rejected connector config: {e}"))
    }

    /// Save config to `{config_dir}/wmediumd-connector.toml` using atomic write.
    ///
    /// Uses temp file + rename so a crash never leaves a truncated config.
    pub fn save(&self, config_dir: &Path) -> Result<PathBuf, ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, text).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Connector config saved to {}", config_path.display());
        Ok(config_path)
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::validation(format!(
                "Invalid version: {} (expected 1-{CONFIG_VERSION})",
                self.version
            )));
        }

        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::validation("socket_path cannot be empty"));
        }

        if self.connect_timeout.is_zero() || self.operation_timeout.is_zero() {
            return Err(ConfigError::validation(
                "connect_timeout and operation_timeout must be non-zero",
            ));
        }

        self.validate_server()?;
        self.validate_medium()
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.executable.trim().is_empty() {
            return Err(ConfigError::validation("server.executable cannot be empty"));
        }

        if server.log_level > MAX_LOG_LEVEL {
            return Err(ConfigError::validation(format!(
                "Invalid server.log_level: {} (must be 0-{MAX_LOG_LEVEL})",
                server.log_level
            )));
        }

        if server.startup_timeout.is_zero() {
            return Err(ConfigError::validation(
                "server.startup_timeout must be non-zero",
            ));
        }

        if let Some(ref table) = server.per_table
            && table.as_os_str().is_empty()
        {
            return Err(ConfigError::validation("server.per_table cannot be empty"));
        }

        Ok(())
    }

    fn validate_medium(&self) -> Result<(), ConfigError> {
        let medium = &self.medium;

        let mut identifiers = HashSet::new();
        let mut macs = HashSet::new();
        for interface in &medium.interfaces {
            if interface.station.is_empty() || interface.interface.is_empty() {
                return Err(ConfigError::validation(format!(
                    "Interface {} needs a station and an interface name",
                    interface.mac
                )));
            }
            if !identifiers.insert(interface.identifier()) {
                return Err(ConfigError::validation(format!(
                    "Duplicate interface {}",
                    interface.identifier()
                )));
            }
            if !macs.insert(interface.mac) {
                return Err(ConfigError::validation(format!(
                    "Duplicate interface MAC {}",
                    interface.mac
                )));
            }
        }

        let known = |id: &str| -> Result<(), ConfigError> {
            if identifiers.contains(id) {
                Ok(())
            } else {
                Err(ConfigError::validation(format!(
                    "{id} is not part of the managed interfaces"
                )))
            }
        };

        for link in &medium.snr_links {
            known(&link.from)?;
            known(&link.to)?;
        }

        for link in &medium.errprob_links {
            known(&link.from)?;
            known(&link.to)?;
            validate_probability(link.errprob, &format!("errprob of {} -> {}", link.from, link.to))?;
        }

        validate_probability(medium.default_auto_errprob, "medium.default_auto_errprob")
    }
}

fn validate_probability(value: f64, what: &str) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::validation(format!(
            "Invalid {what}: {value} (must be 0.0-1.0)"
        )));
    }
    Ok(())
}
