use std::time::Duration;

use anyhow::ensure;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::config::duration::ConfigDuration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: ConfigDuration,
    #[serde(rename = "initial-backoff")]
    pub initial_backoff: ConfigDuration,
    #[serde(rename = "max-backoff")]
    pub max_backoff: ConfigDuration,
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,
    #[serde(rename = "random-factor")]
    pub random_factor: f64,
}

impl ReconnectConfig {
    pub fn settings(&self) -> anyhow::Result<ReconnectSettings> {
        let settings = ReconnectSettings::builder()
            .connect_timeout(self.connect_timeout.into())
            .initial_backoff(self.initial_backoff.into())
            .max_backoff(self.max_backoff.into())
            .backoff_factor(self.backoff_factor)
            .random_factor(self.random_factor)
            .build();
        settings.validate()?;
        Ok(settings)
    }
}

/// Timing of the reconnect loop: how long one attempt may take and how long
/// to wait between attempts.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ReconnectSettings {
    #[builder(default = Duration::from_secs(5))]
    pub connect_timeout: Duration,
    #[builder(default = Duration::from_millis(200))]
    pub initial_backoff: Duration,
    #[builder(default = Duration::from_secs(2))]
    pub max_backoff: Duration,
    #[builder(default = 2.0)]
    pub backoff_factor: f64,
    #[builder(default = 0.2)]
    pub random_factor: f64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ReconnectSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.connect_timeout.is_zero(), "connect-timeout must be greater than zero");
        ensure!(!self.initial_backoff.is_zero(), "initial-backoff must be greater than zero");
        ensure!(
            self.max_backoff >= self.initial_backoff,
            "max-backoff {:?} must not be less than initial-backoff {:?}",
            self.max_backoff,
            self.initial_backoff,
        );
        ensure!(self.backoff_factor >= 1.0, "backoff-factor must be at least 1.0, got {}", self.backoff_factor);
        ensure!(
            (0.0..=1.0).contains(&self.random_factor),
            "random-factor must be within [0, 1], got {}",
            self.random_factor,
        );
        Ok(())
    }
}
