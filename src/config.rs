use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::engine::{default_dimensions, MonitorSettings};

pub const MAX_WINDOW_CAPACITY: usize = 100_000;
pub const MAX_ALERT_CAPACITY: usize = 1_000;
pub const MAX_CHANNEL_CAPACITY: usize = 1 << 20;
/// Lower bound on the live stream poll period.
pub const MIN_RENDER_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    /// WebSocket endpoint of the metrics/alert feed (`ws://` or `wss://`).
    pub feed_url: String,
    /// Recognized dimensions, in selector order.
    /// Set via MONITOR_DIMENSIONS (comma-separated).
    pub dimensions: Vec<String>,
    pub default_dimension: String,
    /// Metric window size, shared across all dimensions. Default: 60.
    pub window_capacity: usize,
    /// Alert history size. Default: 10.
    pub alert_capacity: usize,
    /// Minimum gap between two pushes on the live chart stream.
    pub render_interval_ms: u64,
    pub reconnect: ReconnectConfig,
    /// Bound of the feed -> consumer channel.
    pub channel_capacity: usize,
}

/// Exponential backoff between feed reconnect attempts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_backoff_ms: 500,
            max_backoff_ms: 30_000,
            jitter_ms: 250,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8443,
            feed_url: "ws://localhost:8080/ws".to_string(),
            dimensions: default_dimensions(),
            default_dimension: "gateway".to_string(),
            window_capacity: 60,
            alert_capacity: 10,
            render_interval_ms: 1000,
            reconnect: ReconnectConfig::default(),
            channel_capacity: 1024,
        }
    }
}

impl Config {
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            dimensions: self.dimensions.clone(),
            default_dimension: self.default_dimension.clone(),
            window_capacity: self.window_capacity,
            alert_capacity: self.alert_capacity,
        }
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dimensions.is_empty() {
            anyhow::bail!("at least one dimension must be configured");
        }
        if !self.dimensions.contains(&self.default_dimension) {
            anyhow::bail!(
                "default dimension '{}' is not one of {:?}",
                self.default_dimension,
                self.dimensions
            );
        }
        if !(1..=MAX_WINDOW_CAPACITY).contains(&self.window_capacity) {
            anyhow::bail!(
                "window capacity must be between 1 and {}, got {}",
                MAX_WINDOW_CAPACITY,
                self.window_capacity
            );
        }
        if !(1..=MAX_ALERT_CAPACITY).contains(&self.alert_capacity) {
            anyhow::bail!(
                "alert capacity must be between 1 and {}, got {}",
                MAX_ALERT_CAPACITY,
                self.alert_capacity
            );
        }
        if !(1..=MAX_CHANNEL_CAPACITY).contains(&self.channel_capacity) {
            anyhow::bail!(
                "channel capacity must be between 1 and {}, got {}",
                MAX_CHANNEL_CAPACITY,
                self.channel_capacity
            );
        }
        if self.render_interval_ms < MIN_RENDER_INTERVAL_MS {
            anyhow::bail!(
                "render interval must be at least {}ms, got {}ms",
                MIN_RENDER_INTERVAL_MS,
                self.render_interval_ms
            );
        }
        if self.reconnect.base_backoff_ms > self.reconnect.max_backoff_ms {
            anyhow::bail!(
                "reconnect base backoff ({}ms) exceeds max backoff ({}ms)",
                self.reconnect.base_backoff_ms,
                self.reconnect.max_backoff_ms
            );
        }

        let url = url::Url::parse(&self.feed_url)
            .with_context(|| format!("invalid feed url '{}'", self.feed_url))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            anyhow::bail!("feed url must use ws:// or wss://, got '{}'", url.scheme());
        }
        let local = matches!(
            url.host_str(),
            Some("localhost" | "127.0.0.1" | "0.0.0.0" | "[::1]" | "[::]")
        );
        if local && url.port_or_known_default() == Some(self.port) {
            anyhow::bail!(
                "feed url '{}' points at the monitor's own port {}",
                self.feed_url,
                self.port
            );
        }

        Ok(())
    }
}

/// Load configuration: a YAML file when `path` is given, otherwise `.env` and
/// `MONITOR_*` environment variables. Missing values fall back to defaults.
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let cfg = match path {
        Some(path) => from_yaml_file(path)?,
        None => from_env(),
    };
    cfg.validate()?;
    Ok(cfg)
}

pub fn from_yaml_file(path: &Path) -> anyhow::Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    from_yaml_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

pub fn from_yaml_str(text: &str) -> anyhow::Result<Config> {
    Ok(serde_yaml::from_str(text)?)
}

pub fn from_env() -> Config {
    from_lookup(|key| std::env::var(key).ok())
}

fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Config {
    let defaults = Config::default();
    let get = &get;

    Config {
        port: parsed(get, "MONITOR_PORT").unwrap_or(defaults.port),
        feed_url: get("MONITOR_FEED_URL").unwrap_or(defaults.feed_url),
        dimensions: get("MONITOR_DIMENSIONS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.dimensions),
        default_dimension: get("MONITOR_DEFAULT_DIMENSION")
            .unwrap_or(defaults.default_dimension),
        window_capacity: parsed(get, "MONITOR_WINDOW_CAPACITY").unwrap_or(defaults.window_capacity),
        alert_capacity: parsed(get, "MONITOR_ALERT_CAPACITY").unwrap_or(defaults.alert_capacity),
        render_interval_ms: parsed(get, "MONITOR_RENDER_INTERVAL_MS")
            .unwrap_or(defaults.render_interval_ms),
        reconnect: ReconnectConfig {
            base_backoff_ms: parsed(get, "MONITOR_RECONNECT_BASE_MS")
                .unwrap_or(defaults.reconnect.base_backoff_ms),
            max_backoff_ms: parsed(get, "MONITOR_RECONNECT_MAX_MS")
                .unwrap_or(defaults.reconnect.max_backoff_ms),
            jitter_ms: parsed(get, "MONITOR_RECONNECT_JITTER_MS")
                .unwrap_or(defaults.reconnect.jitter_ms),
        },
        channel_capacity: parsed(get, "MONITOR_CHANNEL_CAPACITY").unwrap_or(defaults.channel_capacity),
    }
}

fn parsed<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    get(key).and_then(|v| v.trim().parse().ok())
}
