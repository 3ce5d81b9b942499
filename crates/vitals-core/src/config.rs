use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const DEFAULT_APP_NAME: &str = "Vitals";
pub const DEFAULT_NOTIFY_COMMAND: &str = "notify-send";

/// Top-level config (vitals.toml + VITALS_* env overrides).
///
/// Env keys use `__` between section and field so that field names may
/// themselves contain underscores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitalsConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the daemon reloads the reminder snapshot from the store.
    /// Override with env var: VITALS_SCHEDULER__REFRESH_SECS=30
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

/// Answer given when the scheduler asks for notification permission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionPolicy {
    #[default]
    Allow,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub permission: PermissionPolicy,
    /// Application name shown by the desktop notification daemon.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Optional icon name or path passed to the notifier.
    pub icon: Option<String>,
    /// Notifier executable, looked up on PATH.
    #[serde(default = "default_notify_command")]
    pub command: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            permission: PermissionPolicy::default(),
            app_name: default_app_name(),
            icon: None,
            command: default_notify_command(),
        }
    }
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}
fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}
fn default_notify_command() -> String {
    DEFAULT_NOTIFY_COMMAND.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.vitals/vitals.db", home)
}

impl VitalsConfig {
    /// Load config from a TOML file with VITALS_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.vitals/vitals.toml
    ///
    /// A missing file is not an error; every section has defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        debug!(%path, "loading config");

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("VITALS_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.vitals/vitals.toml", home)
}
