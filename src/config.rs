use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use secrecy::SecretString;
use serde::Deserialize;

use crate::monitoring::alerts::ParseMode;
use crate::report::assembler::MIN_BUDGET;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub history: HistoryConfig,
    pub leagues: Vec<League>,
    pub providers: ProvidersConfig,
    pub report: ReportConfig,
    pub monitoring: MonitoringConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    pub window_days: u32,
    /// IANA zone name used for "today" and kickoff display.
    pub timezone: String,
    pub max_fixtures_per_date: usize,
    #[serde(default = "default_concurrency")]
    pub history_concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

impl ScannerConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub lookback_days: u32,
    pub page_size: u32,
    pub sample_size: usize,
}

/// A tracked competition. Position in `AppConfig::leagues` is its priority.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct League {
    pub code: String,
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    pub primary: ProviderConfig,
    pub secondary: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    pub default_retry_after_secs: u64,
    pub max_retry_after_secs: u64,
}

impl ProviderConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Wait to apply after a 429, given what the provider asked for.
    pub fn retry_delay(&self, requested: Option<Duration>) -> Duration {
        let requested = requested.unwrap_or(Duration::from_secs(self.default_retry_after_secs));
        requested.min(Duration::from_secs(self.max_retry_after_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub max_message_chars: usize,
    pub parse_mode: ParseMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub api_base_url: String,
    pub max_message_chars: usize,
    pub messages_per_second: u32,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub football_data_api_key: Option<SecretString>,
    pub api_football_key: Option<SecretString>,
    pub telegram_bot_token: Option<SecretString>,
    pub telegram_chat_id: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let secret = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from)
        };

        Self {
            football_data_api_key: secret("FOOTBALL_DATA_API_KEY"),
            api_football_key: secret("API_FOOTBALL_KEY"),
            telegram_bot_token: secret("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, overlaying environment variables for secrets.
    pub fn load(path: &Path) -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok((config, Secrets::from_env()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.scanner.tz()?;
        if self.leagues.is_empty() {
            anyhow::bail!("At least one league must be configured");
        }
        if self.report.max_message_chars < MIN_BUDGET {
            anyhow::bail!("report.max_message_chars must be at least {MIN_BUDGET}");
        }
        if self.telegram.max_message_chars < MIN_BUDGET {
            anyhow::bail!("telegram.max_message_chars must be at least {MIN_BUDGET}");
        }
        if self.history.sample_size == 0 {
            anyhow::bail!("history.sample_size must be positive");
        }
        Ok(())
    }
}
