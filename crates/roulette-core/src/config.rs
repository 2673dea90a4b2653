use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Which backend protocol the orchestrator speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolKind {
    /// Legacy combined endpoint: one `POST /api` with retry on transient errors.
    SingleCall,
    /// `metadata → select → details`, no retry, client-computed stats.
    MultiStep,
}

impl std::str::FromStr for ProtocolKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single-call" | "single" | "legacy" => Ok(Self::SingleCall),
            "multi-step" | "multi" => Ok(Self::MultiStep),
            other => anyhow::bail!("unknown protocol '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_protocol")]
    pub protocol: ProtocolKind,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Extra attempts after the first one (single-call protocol only).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between attempts. Clamped to 400..=1200 ms.
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_progress_tick_ms")]
    pub progress_tick_ms: u64,
    #[serde(default = "default_phase_tick_ms")]
    pub phase_tick_ms: u64,
    /// Progress approaches but never reaches this percentage while waiting.
    #[serde(default = "default_ceiling")]
    pub ceiling: f64,
    /// Fraction of the remaining distance to the ceiling covered per tick.
    #[serde(default = "default_rate")]
    pub rate: f64,
    /// How long the bar stays at 100% before the result is revealed.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,
    #[serde(default = "default_error_dismiss_secs")]
    pub error_dismiss_secs: u64,
    /// Base used when building shareable links.
    #[serde(default = "default_share_base")]
    pub share_base: String,
}

/// Persisted history / recent-list files and their bounds. File names resolve
/// under the data directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
    #[serde(default = "default_recent_file")]
    pub recent_file: PathBuf,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    #[serde(default = "default_recent_cap")]
    pub recent_cap: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            protocol: default_protocol(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            progress_tick_ms: default_progress_tick_ms(),
            phase_tick_ms: default_phase_tick_ms(),
            ceiling: default_ceiling(),
            rate: default_rate(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_slots: default_max_slots(),
            error_dismiss_secs: default_error_dismiss_secs(),
            share_base: default_share_base(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            recent_file: default_recent_file(),
            history_cap: default_history_cap(),
            recent_cap: default_recent_cap(),
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.clamp(400, 1200))
    }
}

impl AnimationConfig {
    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms.max(1))
    }

    pub fn phase_tick(&self) -> Duration {
        Duration::from_millis(self.phase_tick_ms.max(1))
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl UiConfig {
    pub fn error_dismiss(&self) -> Duration {
        Duration::from_secs(self.error_dismiss_secs)
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5050".to_string()
}

fn default_protocol() -> ProtocolKind {
    ProtocolKind::MultiStep
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1200
}

fn default_progress_tick_ms() -> u64 {
    100
}

fn default_phase_tick_ms() -> u64 {
    400
}

fn default_ceiling() -> f64 {
    90.0
}

fn default_rate() -> f64 {
    0.05
}

fn default_settle_ms() -> u64 {
    400
}

fn default_max_slots() -> usize {
    5
}

fn default_error_dismiss_secs() -> u64 {
    4
}

fn default_share_base() -> String {
    "http://127.0.0.1:5050/".to_string()
}

fn default_history_file() -> PathBuf {
    PathBuf::from("history.json")
}

fn default_recent_file() -> PathBuf {
    PathBuf::from("recent_lists.json")
}

fn default_history_cap() -> usize {
    10
}

fn default_recent_cap() -> usize {
    10
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            animation: AnimationConfig::default(),
            ui: UiConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}
