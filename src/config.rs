use config::{Config, ConfigError, Environment, File};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::Path;
use url::Url;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    pub scheduler: SchedulerConfig,
    pub scraper: ScraperConfig,
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_telegram_api")]
    pub api_base_url: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base_url: default_telegram_api(),
        }
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base_url.trim_end_matches('/'),
            self.bot_token
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// Sent with every source's requests; a source's own cookies win on conflict.
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    pub request_timeout_secs: u64,
    pub max_pages: u32,
    pub max_detail_items: usize,
    #[serde(default)]
    pub page_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Listing pages POSTed page by page to a form endpoint.
    PaginatedApi,
    /// One index page of links, then one detail page per link.
    IndexDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Form endpoint for `paginated_api`, index page for `index_detail`.
    pub url: String,
    pub base_url: String,
    pub listing_pattern: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    #[serde(default)]
    pub default_category: Option<String>,
    #[serde(default)]
    pub id_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Daily rolling log files go here when set.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_telegram_api() -> String {
    DEFAULT_TELEGRAM_API.to_string()
}

fn default_log_level() -> String {
    "order_watcher=info".to_string()
}

impl AppConfig {
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config"), explicit)
    }

    /// Layers `default`, `<RUN_MODE>` and `local` from `dir`, then `explicit`,
    /// then `ORDERWATCH__*` environment variables.
    pub fn load_from(dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::from(dir.join("default")))
            .add_source(File::from(dir.join(&run_mode)).required(false))
            .add_source(File::from(dir.join("local")).required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        let s = builder
            .add_source(Environment::with_prefix("ORDERWATCH").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::Message("Scheduler interval_secs must be greater than 0".into()));
        }

        if self.scraper.max_pages == 0 {
            return Err(ConfigError::Message("Scraper max_pages must be greater than 0".into()));
        }

        if self.scraper.max_detail_items == 0 {
            return Err(ConfigError::Message("Scraper max_detail_items must be greater than 0".into()));
        }

        if self.scraper.request_timeout_secs == 0 {
            return Err(ConfigError::Message("Scraper request_timeout_secs must be greater than 0".into()));
        }

        if self.scraper.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("Scraper user_agent must not be empty".into()));
        }

        if Url::parse(&self.telegram.api_base_url).is_err() {
            return Err(ConfigError::Message("Invalid telegram api_base_url".into()));
        }

        if !self.sources.iter().any(|source| source.enabled) {
            return Err(ConfigError::Message("At least one source must be enabled".into()));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Message("Source name must not be empty".into()));
            }

            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::Message(format!("Duplicate source name: {}", source.name)));
            }

            if Url::parse(&source.url).is_err() {
                return Err(ConfigError::Message(format!("Invalid url for source {}", source.name)));
            }

            if Url::parse(&source.base_url).is_err() {
                return Err(ConfigError::Message(format!("Invalid base_url for source {}", source.name)));
            }

            if let Err(e) = Regex::new(&source.listing_pattern) {
                return Err(ConfigError::Message(format!(
                    "Invalid listing_pattern for source {}: {}",
                    source.name, e
                )));
            }
        }

        Ok(())
    }

    /// Checks the notification channel. Not needed for dry runs.
    pub fn validate_delivery(&self) -> Result<(), ConfigError> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::Message("Telegram bot_token is required".into()));
        }

        if self.telegram.chat_id.trim().is_empty() {
            return Err(ConfigError::Message("Telegram chat_id is required".into()));
        }

        Ok(())
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|source| source.enabled)
    }
}
