//! Buffer configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::serde_duration;

/// Error returned when a configuration file cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML (or JSON) for a [`Config`].
    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Options read once when a [`ThreadSafeBuffer`](crate::ThreadSafeBuffer) is created.
///
/// A zero duration means "no limit" for both `read_timeout` and `drain_time`.
///
/// Deserializes from YAML or JSON; fields that are left out take their value
/// from [`Config::unlimited`]:
///
/// ```
/// use giztoy_tsbuffer::Config;
/// use std::time::Duration;
///
/// let cfg = Config::from_yaml("max_buffer: true\nmax_buffer_size: 4096\nread_timeout: 250ms\n").unwrap();
/// assert!(cfg.max_buffer);
/// assert_eq!(cfg.max_buffer_size, 4096);
/// assert!(cfg.drain_read);
/// assert_eq!(cfg.read_timeout, Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enforce `max_buffer_size` on writes. When false the size is ignored.
    pub max_buffer: bool,
    /// Maximum number of unread bytes the buffer may hold.
    pub max_buffer_size: usize,
    /// After close, keep serving reads until the buffer is drained.
    pub drain_read: bool,
    /// How long a single read may take before failing.
    #[serde(with = "serde_duration")]
    pub read_timeout: Duration,
    /// How long after close draining reads are honored.
    #[serde(with = "serde_duration")]
    pub drain_time: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl Config {
    /// No capacity limit, drain on close, no timeouts.
    pub fn unlimited() -> Self {
        Self {
            max_buffer: false,
            max_buffer_size: 0,
            drain_read: true,
            read_timeout: Duration::ZERO,
            drain_time: Duration::ZERO,
        }
    }

    /// Enable capacity enforcement with the given maximum size.
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer = true;
        self.max_buffer_size = size;
        self
    }

    /// Enable or disable draining reads after close.
    pub fn drain_read(mut self, enabled: bool) -> Self {
        self.drain_read = enabled;
        self
    }

    /// Set the per-read deadline. Zero disables it.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the drain window after close. Zero means unbounded.
    pub fn drain_time(mut self, window: Duration) -> Self {
        self.drain_time = window;
        self
    }

    /// Parse a configuration from YAML (JSON is accepted as well).
    pub fn from_yaml(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Capacity limit in effect, if any.
    pub(crate) fn capacity(&self) -> Option<usize> {
        self.max_buffer.then_some(self.max_buffer_size)
    }

    /// Read timeout in effect, if any.
    pub(crate) fn timeout(&self) -> Option<Duration> {
        (!self.read_timeout.is_zero()).then_some(self.read_timeout)
    }

    /// Drain window in effect, if any.
    pub(crate) fn drain_window(&self) -> Option<Duration> {
        (!self.drain_time.is_zero()).then_some(self.drain_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited() {
        let cfg = Config::unlimited();
        assert!(!cfg.max_buffer);
        assert!(cfg.drain_read);
        assert!(cfg.read_timeout.is_zero());
        assert!(cfg.drain_time.is_zero());
        assert_eq!(cfg, Config::default());

        assert_eq!(cfg.capacity(), None);
        assert_eq!(cfg.timeout(), None);
        assert_eq!(cfg.drain_window(), None);
    }

    #[test]
    fn test_builder() {
        let cfg = Config::unlimited()
            .max_buffer_size(16)
            .drain_read(false)
            .read_timeout(Duration::from_millis(5))
            .drain_time(Duration::from_secs(1));

        assert_eq!(cfg.capacity(), Some(16));
        assert!(!cfg.drain_read);
        assert_eq!(cfg.timeout(), Some(Duration::from_millis(5)));
        assert_eq!(cfg.drain_window(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_max_buffer_size_ignored_when_disabled() {
        let cfg = Config {
            max_buffer: false,
            max_buffer_size: 10,
            ..Config::unlimited()
        };
        assert_eq!(cfg.capacity(), None);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
max_buffer: true
max_buffer_size: 1024
drain_read: false
read_timeout: 1.5s
drain_time: 1m30s
"#;
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.capacity(), Some(1024));
        assert!(!cfg.drain_read);
        assert_eq!(cfg.read_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.drain_time, Duration::from_secs(90));
    }

    #[test]
    fn test_from_yaml_defaults() {
        let cfg = Config::from_yaml("read_timeout: 10ms").unwrap();
        assert_eq!(
            cfg,
            Config::unlimited().read_timeout(Duration::from_millis(10))
        );

        let cfg = Config::from_yaml("{}").unwrap();
        assert_eq!(cfg, Config::unlimited());
    }

    #[test]
    fn test_from_yaml_invalid_duration() {
        let err = Config::from_yaml("read_timeout: soon").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn test_json_nanoseconds() {
        let cfg: Config = serde_json::from_str(r#"{"drain_time": 2000000}"#).unwrap();
        assert_eq!(cfg.drain_time, Duration::from_millis(2));
        assert!(cfg.drain_read);
    }

    #[test]
    fn test_float_durations_are_seconds() {
        let cfg = Config::from_yaml("read_timeout: 1.5\ndrain_time: 0.25").unwrap();
        assert_eq!(cfg.read_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.drain_time, Duration::from_millis(250));

        let err = Config::from_yaml("read_timeout: -1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_serialize_round_trip() {
        let cfg = Config::unlimited()
            .max_buffer_size(64)
            .read_timeout(Duration::from_millis(250));

        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(yaml.contains("250ms"));
        assert_eq!(Config::from_yaml(&yaml).unwrap(), cfg);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/tsbuffer.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
