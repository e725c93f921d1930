//! # Controller Configuration
//!
//! Tunables for the [`Controller`](crate::Controller): queue sizes and the retry
//! schedule applied after a reconcile fails. The struct derives `Deserialize` so a host
//! can embed it in its own configuration; [`ControllerConfig::from_env`] applies
//! environment overrides on top of the defaults.

use crate::error::FrameworkError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Capacity of the controller's request channel. Worker queues are unbounded and
    /// folded to the newest snapshot, so one busy primary never stalls dispatch.
    pub channel_buffer: usize,
    /// Delay before the first retry of a failed reconcile.
    pub initial_backoff_ms: u64,
    /// Upper bound of the exponential retry delay.
    pub max_backoff_ms: u64,
    /// Retries of the same snapshot after the first failed attempt. Zero disables retry.
    pub max_retries: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 32,
            initial_backoff_ms: 2_000,
            max_backoff_ms: 120_000,
            max_retries: 5,
        }
    }
}

impl ControllerConfig {
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff_ms = initial.as_millis() as u64;
        self.max_backoff_ms = max.as_millis() as u64;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `attempt` (1-based): `initial * 2^(attempt-1)`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }

    /// Defaults overridden by `<PREFIX>_CHANNEL_BUFFER`, `<PREFIX>_INITIAL_BACKOFF_MS`,
    /// `<PREFIX>_MAX_BACKOFF_MS` and `<PREFIX>_MAX_RETRIES`.
    pub fn from_env(prefix: &str) -> Result<Self, FrameworkError> {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, FrameworkError> {
        fn parse<T: std::str::FromStr>(key: &str, raw: String) -> Result<T, FrameworkError> {
            raw.trim()
                .parse()
                .map_err(|_| FrameworkError::InvalidConfig(format!("{key}={raw}")))
        }

        let mut config = Self::default();
        let key = |name: &str| format!("{prefix}_{name}");

        if let Some(raw) = lookup(&key("CHANNEL_BUFFER")) {
            config.channel_buffer = parse(&key("CHANNEL_BUFFER"), raw)?;
        }
        if let Some(raw) = lookup(&key("INITIAL_BACKOFF_MS")) {
            config.initial_backoff_ms = parse(&key("INITIAL_BACKOFF_MS"), raw)?;
        }
        if let Some(raw) = lookup(&key("MAX_BACKOFF_MS")) {
            config.max_backoff_ms = parse(&key("MAX_BACKOFF_MS"), raw)?;
        }
        if let Some(raw) = lookup(&key("MAX_RETRIES")) {
            config.max_retries = parse(&key("MAX_RETRIES"), raw)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FrameworkError> {
        if self.channel_buffer == 0 {
            return Err(FrameworkError::InvalidConfig(
                "channel_buffer must be greater than zero".to_string(),
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(FrameworkError::InvalidConfig(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn backoff_doubles_until_capped() {
        let config = ControllerConfig::default()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(1_000));
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(4), Duration::from_millis(800));
        assert_eq!(config.backoff(5), Duration::from_millis(1_000));
        assert_eq!(config.backoff(60), Duration::from_millis(1_000));
    }

    #[test]
    fn env_overrides_apply_on_top_of_defaults() {
        let vars: HashMap<&str, &str> = [
            ("OP_MAX_RETRIES", "2"),
            ("OP_INITIAL_BACKOFF_MS", " 50 "),
        ]
        .into_iter()
        .collect();
        let config =
            ControllerConfig::from_lookup("OP", |k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.initial_backoff_ms, 50);
        assert_eq!(config.channel_buffer, ControllerConfig::default().channel_buffer);
    }

    #[test]
    fn invalid_env_value_is_reported() {
        let err = ControllerConfig::from_lookup("OP", |k| {
            (k == "OP_CHANNEL_BUFFER").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            FrameworkError::InvalidConfig("OP_CHANNEL_BUFFER=lots".to_string())
        );
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: ControllerConfig = serde_json::from_str(r#"{"max_retries": 0}"#).unwrap();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.max_backoff_ms, 120_000);
    }

    #[test]
    fn rejects_inverted_backoff_bounds() {
        let config = ControllerConfig::default()
            .with_backoff(Duration::from_secs(10), Duration::from_secs(1));
        assert!(config.validate().is_err());
    }
}
