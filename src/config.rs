use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Status of config file loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLoadStatus {
    /// Config loaded successfully from existing file
    Loaded,
    /// Created default config file (first run)
    Created,
    /// Error occurred during loading, using defaults.
    Error(String),
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Points awarded for each wizard action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    /// Paid once, the first time the overview is left.
    pub journey_start: u32,
    pub workflow_select: u32,
    /// Replaces `workflow_select` when the custom workflow is chosen.
    pub custom_workflow: u32,
    pub pain_point_add: u32,
    pub pain_point_select: u32,
    pub solution_add: u32,
    pub tools_save: u32,
    /// Paid on top of the action that earned the badge.
    pub badge_earn: u32,
    pub completion_bonus: u32,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            journey_start: 5,
            workflow_select: 10,
            custom_workflow: 15,
            pain_point_add: 5,
            pain_point_select: 10,
            solution_add: 10,
            tools_save: 5,
            badge_earn: 20,
            completion_bonus: 50,
        }
    }
}

/// Upper bounds on list sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_pain_points: usize,
    pub max_solutions_per_pain_point: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pain_points: 10,
            max_solutions_per_pain_point: 5,
        }
    }
}

/// Behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Seconds a notification stays on screen.
    pub notification_secs: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            notification_secs: 3,
        }
    }
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Catalog TOML replacing the built-in catalog. Empty means built-in.
    pub catalog: String,
    /// Directory exported plans are written to.
    pub export_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            catalog: String::new(),
            export_dir: ".".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub points: PointsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Expand `~` to home directory in a path string
    pub fn expand_tilde(path: &str) -> PathBuf {
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }

    /// Get the expanded catalog path, if one is configured
    pub fn catalog_path(&self) -> Option<PathBuf> {
        if self.paths.catalog.trim().is_empty() {
            None
        } else {
            Some(Self::expand_tilde(&self.paths.catalog))
        }
    }

    /// Get the expanded export directory
    pub fn export_dir(&self) -> PathBuf {
        Self::expand_tilde(&self.paths.export_dir)
    }
}

/// Loaded configuration with metadata
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub status: ConfigLoadStatus,
}

/// Get the platform-appropriate config directory
fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "compas", "workflow-detective")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the full path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load configuration from file, environment, and defaults.
///
/// `explicit_path` (from `--config`) wins over the platform location and is
/// never created on the user's behalf.
pub fn load_config(explicit_path: Option<&Path>) -> LoadedConfig {
    if let Some(path) = explicit_path {
        let (config, status) = match read_config(path) {
            Ok(config) => {
                info!(path = ?path, "config_loaded");
                (config, ConfigLoadStatus::Loaded)
            }
            Err(e) => (Config::default(), ConfigLoadStatus::Error(e)),
        };
        return LoadedConfig {
            config: apply_env_overrides(config),
            config_path: path.to_path_buf(),
            status,
        };
    }

    let config_path = match get_config_path() {
        Some(path) => path,
        None => {
            warn!("config_dir_unavailable");
            return LoadedConfig {
                config: apply_env_overrides(Config::default()),
                config_path: PathBuf::from("config.toml"),
                status: ConfigLoadStatus::Error("Could not determine config directory".to_string()),
            };
        }
    };

    debug!(path = ?config_path, "config_path_resolved");

    let (config, status) = load_or_create_config(&config_path);

    LoadedConfig {
        config: apply_env_overrides(config),
        config_path,
        status,
    }
}

/// Read and parse a config file.
fn read_config(path: &Path) -> Result<Config, String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        warn!(path = ?path, error = %e, "config_read_failed");
        format!("Failed to read config: {}", e)
    })?;

    toml::from_str::<Config>(&contents).map_err(|e| {
        warn!(path = ?path, error = %e, "config_parse_failed");
        format!("Malformed TOML: {}", e)
    })
}

/// Load config from file, or create default if not exists
fn load_or_create_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    if let Err(e) = fs::metadata(config_path)
        && e.kind() == io::ErrorKind::NotFound
    {
        return create_default_config(config_path);
    }

    match read_config(config_path) {
        Ok(config) => {
            info!(path = ?config_path, "config_loaded");
            (config, ConfigLoadStatus::Loaded)
        }
        Err(e) => (Config::default(), ConfigLoadStatus::Error(e)),
    }
}

/// Create the default config file
fn create_default_config(config_path: &Path) -> (Config, ConfigLoadStatus) {
    let config = Config::default();

    if let Some(parent) = config_path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!(path = ?parent, error = %e, "config_dir_create_failed");
        return (
            config,
            ConfigLoadStatus::Error(format!("Could not create config directory: {}", e)),
        );
    }

    let toml_content = match toml::to_string_pretty(&config) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "config_serialize_failed");
            return (
                config,
                ConfigLoadStatus::Error(format!("Serialization error: {}", e)),
            );
        }
    };

    match fs::write(config_path, &toml_content) {
        Ok(()) => {
            info!(path = ?config_path, "config_created");
            (config, ConfigLoadStatus::Created)
        }
        Err(e) => {
            warn!(path = ?config_path, error = %e, "config_write_failed");
            (
                config,
                ConfigLoadStatus::Error(format!("Write error: {}", e)),
            )
        }
    }
}

/// Apply environment variable overrides to config
fn apply_env_overrides(config: Config) -> Config {
    apply_overrides(config, |key| env::var(key).ok())
}

fn apply_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(level) = lookup("DETECTIVE_LOG") {
        debug!(var = "DETECTIVE_LOG", field = "logging.level", "config_env_override");
        config.logging.level = level;
    }

    if let Some(path) = lookup("DETECTIVE_CATALOG") {
        debug!(var = "DETECTIVE_CATALOG", field = "paths.catalog", "config_env_override");
        config.paths.catalog = path;
    }

    if let Some(path) = lookup("DETECTIVE_EXPORT_DIR") {
        debug!(var = "DETECTIVE_EXPORT_DIR", field = "paths.export_dir", "config_env_override");
        config.paths.export_dir = path;
    }

    config
}
