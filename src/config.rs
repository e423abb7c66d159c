use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::models::ProductWatchEntry;

/// Placeholder values shipped in `config.example.toml`.
pub const PLACEHOLDER_BOT_TOKEN: &str = "YOUR_ACTUAL_TELEGRAM_BOT_TOKEN";
pub const PLACEHOLDER_CHAT_ID: &str = "YOUR_ACTUAL_TELEGRAM_CHAT_ID";

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub olx: OlxConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub products: Vec<ProductWatchEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds to sleep between the end of one cycle and the start of the next.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// Merge the on-disk notified set into memory before every cycle.
    #[serde(default)]
    pub reload_each_cycle: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_notified_items_file")]
    pub notified_items_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OlxConfig {
    #[serde(default = "default_olx_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_check_interval() -> u64 {
    3600
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_notified_items_file() -> PathBuf {
    PathBuf::from("notified_items.json")
}

fn default_olx_base_url() -> String {
    "https://www.olx.pl".to_string()
}

fn default_page_limit() -> u32 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36"
        .to_string()
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_telegram_api_base(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            reload_each_cycle: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            notified_items_file: default_notified_items_file(),
        }
    }
}

impl Default for OlxConfig {
    fn default() -> Self {
        Self {
            base_url: default_olx_base_url(),
            page_limit: default_page_limit(),
            user_agent: default_user_agent(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl TelegramConfig {
    /// True when both credentials are present and not the shipped placeholders.
    pub fn is_configured(&self) -> bool {
        let usable = |value: &Option<String>, placeholder: &str| {
            value
                .as_deref()
                .map(str::trim)
                .is_some_and(|v| !v.is_empty() && v != placeholder)
        };
        usable(&self.bot_token, PLACEHOLDER_BOT_TOKEN) && usable(&self.chat_id, PLACEHOLDER_CHAT_ID)
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, overlaid with `WATCHER__*` environment variables.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            // e.g. WATCHER__TELEGRAM__BOT_TOKEN
            .add_source(Environment::with_prefix("WATCHER").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string without environment overrides.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks only. Missing products or credentials are not errors here:
    /// the scheduler reports them every cycle instead of refusing to start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.check_interval_secs == 0 {
            return Err(ConfigError::Message("scheduler.check_interval_secs must be greater than 0".into()));
        }

        if self.scheduler.fetch_timeout_secs == 0 {
            return Err(ConfigError::Message("scheduler.fetch_timeout_secs must be greater than 0".into()));
        }

        if self.store.notified_items_file.as_os_str().is_empty() {
            return Err(ConfigError::Message("store.notified_items_file must not be empty".into()));
        }

        if Url::parse(&self.olx.base_url).is_err() {
            return Err(ConfigError::Message("Invalid olx.base_url format".into()));
        }

        if self.olx.page_limit == 0 {
            return Err(ConfigError::Message("olx.page_limit must be greater than 0".into()));
        }

        if Url::parse(&self.telegram.api_base).is_err() {
            return Err(ConfigError::Message("Invalid telegram.api_base format".into()));
        }

        Ok(())
    }
}
