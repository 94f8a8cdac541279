use serde::{Deserialize, Serialize};

/// Transformation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base address of the transformation service.
    pub base_url: String,
    /// Request timeout in seconds. Transformations can take a while.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 600,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
        }
    }
}

/// Playback and visualization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Interval between time-advance ticks while playing, in milliseconds.
    pub tick_interval_ms: u64,
    /// Number of bars in the waveform display.
    pub waveform_bars: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            waveform_bars: 50,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
    pub playback: PlaybackConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert_eq!(config.service.base_url, "http://localhost:8000");
        assert_eq!(config.service.request_timeout_secs, 600);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file_logging);
        assert_eq!(config.playback.tick_interval_ms, 250);
        assert_eq!(config.playback.waveform_bars, 50);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [service]
            base_url = "http://studio.local:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.service.base_url, "http://studio.local:9000");
        assert_eq!(config.service.request_timeout_secs, 600);
        assert_eq!(config.logging.level, "info");
    }
}
