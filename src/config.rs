use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{LooperError, Result};
use crate::speed::DEFAULT_SPEEDS;
use crate::time_format::{DisplayPolicy, SINGLE_MINUTE_MAX};

/// Configuration for the segment looper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Loop bound window and repair constants
    pub range: RangeConfig,

    /// Playback speed multipliers
    pub speed: SpeedConfig,

    /// Loop watchdog timing
    pub watchdog: WatchdogConfig,

    /// Bump step sizes and hold-to-repeat timing
    pub adjust: AdjustConfig,

    /// Time display settings
    pub display: DisplayConfig,

    /// External segment lookup settings
    pub segments: SegmentsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    /// Lowest value either bound may take
    pub min_seconds: f64,

    /// Highest value either bound may take (unset = unbounded)
    pub max_seconds: Option<f64>,

    /// Minimum distance between start and end
    pub min_gap: f64,

    /// Loop length used when the end is missing or invalid
    pub default_span: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Multipliers in cycle order
    pub speeds: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Poll period in milliseconds
    pub poll_interval_ms: u64,

    /// Loop back once the position is within this many seconds of the end
    pub end_tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustConfig {
    /// Repeat period while a bump control is held (milliseconds)
    pub repeat_interval_ms: u64,

    /// Fine bump step in seconds
    pub small_step: f64,

    /// Coarse bump step in seconds
    pub large_step: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Time rendering policy
    pub policy: DisplayPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentsConfig {
    /// Path or http(s) URL of the segment lookup document
    pub source: Option<String>,

    /// Request timeout for remote lookups in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
}

impl WatchdogConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl AdjustConfig {
    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }
}

impl Config {
    /// Load configuration from the first readable file, then environment
    pub fn load() -> Result<Self> {
        let config_paths = [
            "segment-looper.toml",
            "config/segment-looper.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(max) = std::env::var("SEGMENT_LOOPER_MAX_SECONDS") {
            config.range.max_seconds = max.parse().ok();
        }

        if let Ok(poll) = std::env::var("SEGMENT_LOOPER_POLL_MS") {
            config.watchdog.poll_interval_ms = poll.parse().unwrap_or(100);
        }

        if let Ok(source) = std::env::var("SEGMENT_LOOPER_SEGMENTS") {
            config.segments.source = Some(source);
        }

        if let Ok(log_level) = std::env::var("SEGMENT_LOOPER_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.as_ref().display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.speed.speeds.is_empty() {
            return Err(LooperError::Config("speeds must not be empty".to_string()));
        }
        if self.speed.speeds.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(LooperError::Config("speeds must be positive numbers".to_string()));
        }

        if !(self.range.min_gap.is_finite() && self.range.min_gap > 0.0) {
            return Err(LooperError::Config("min_gap must be greater than 0".to_string()));
        }
        if !(self.range.default_span.is_finite() && self.range.default_span > 0.0) {
            return Err(LooperError::Config("default_span must be greater than 0".to_string()));
        }
        if !self.range.min_seconds.is_finite() || self.range.min_seconds < 0.0 {
            return Err(LooperError::Config("min_seconds must be 0 or more".to_string()));
        }
        if let Some(max) = self.range.max_seconds {
            if !max.is_finite() || max <= self.range.min_seconds + self.range.min_gap {
                return Err(LooperError::Config(
                    "max_seconds must leave room for at least one gap above min_seconds".to_string(),
                ));
            }
        }

        if self.watchdog.poll_interval_ms == 0 {
            return Err(LooperError::Config("poll_interval_ms must be greater than 0".to_string()));
        }
        if !self.watchdog.end_tolerance.is_finite() || self.watchdog.end_tolerance < 0.0 {
            return Err(LooperError::Config("end_tolerance must be 0 or more".to_string()));
        }
        if self.adjust.repeat_interval_ms == 0 {
            return Err(LooperError::Config("repeat_interval_ms must be greater than 0".to_string()));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Segment Looper Configuration:\n\
            - Window: {} .. {}\n\
            - Speeds: {}\n\
            - Poll Interval: {}ms\n\
            - Repeat Interval: {}ms\n\
            - Display: {:?}\n\
            - Segments: {}",
            self.range.min_seconds,
            self.range.max_seconds.map_or("unbounded".to_string(), |m| m.to_string()),
            self.speed.speeds.iter().map(|s| format!("{}x", s)).collect::<Vec<_>>().join(", "),
            self.watchdog.poll_interval_ms,
            self.adjust.repeat_interval_ms,
            self.display.policy,
            self.segments.source.as_deref().unwrap_or("none"),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            range: RangeConfig::default(),
            speed: SpeedConfig::default(),
            watchdog: WatchdogConfig::default(),
            adjust: AdjustConfig::default(),
            display: DisplayConfig::default(),
            segments: SegmentsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            min_seconds: 0.0,
            max_seconds: None,
            min_gap: 0.1,
            default_span: 3.0,
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            speeds: DEFAULT_SPEEDS.to_vec(),
        }
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            end_tolerance: 0.05,
        }
    }
}

impl Default for AdjustConfig {
    fn default() -> Self {
        Self {
            repeat_interval_ms: 120,
            small_step: 0.1,
            large_step: 0.5,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            policy: DisplayPolicy::General,
        }
    }
}

impl Default for SegmentsConfig {
    fn default() -> Self {
        Self {
            source: Some("data/segments.json".to_string()),
            timeout_seconds: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_max_seconds(mut self, max_seconds: Option<f64>) -> Self {
        self.config.range.max_seconds = max_seconds;
        self
    }

    /// Cap the window at one displayed minute and render as `0:SS.s`
    pub fn single_minute(mut self) -> Self {
        self.config.range.max_seconds = Some(SINGLE_MINUTE_MAX);
        self.config.display.policy = DisplayPolicy::SingleMinute;
        self
    }

    pub fn with_speeds(mut self, speeds: Vec<f64>) -> Self {
        self.config.speed.speeds = speeds;
        self
    }

    pub fn with_poll_interval_ms(mut self, interval: u64) -> Self {
        self.config.watchdog.poll_interval_ms = interval;
        self
    }

    pub fn with_repeat_interval_ms(mut self, interval: u64) -> Self {
        self.config.adjust.repeat_interval_ms = interval;
        self
    }

    pub fn with_segments_source(mut self, source: String) -> Self {
        self.config.segments.source = Some(source);
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.speed.speeds, vec![0.5, 0.75, 1.0]);
        assert_eq!(config.watchdog.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.adjust.repeat_interval(), Duration::from_millis(120));
        assert!(config.range.max_seconds.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .single_minute()
            .with_speeds(vec![1.0, 2.0])
            .with_poll_interval_ms(50)
            .build();

        assert_eq!(config.range.max_seconds, Some(59.9));
        assert_eq!(config.display.policy, DisplayPolicy::SingleMinute);
        assert_eq!(config.speed.speeds, vec![1.0, 2.0]);
        assert_eq!(config.watchdog.poll_interval_ms, 50);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
        assert!(ConfigBuilder::new().with_speeds(vec![]).build().validate().is_err());
        assert!(ConfigBuilder::new().with_poll_interval_ms(0).build().validate().is_err());
        assert!(ConfigBuilder::new().with_max_seconds(Some(0.05)).build().validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("segment-looper.toml");

        let config = ConfigBuilder::new().single_minute().with_log_level("debug").build();
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.range.max_seconds, Some(59.9));
        assert_eq!(loaded.display.policy, DisplayPolicy::SingleMinute);
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("partial.toml");
        std::fs::write(&path, "[speed]\nspeeds = [0.25, 1.0]\n").unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.speed.speeds, vec![0.25, 1.0]);
        assert_eq!(loaded.watchdog.poll_interval_ms, 100);
    }
}
