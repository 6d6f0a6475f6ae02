use std::time::Duration;

use rand::Rng;

use crate::config::reconnect::ReconnectSettings;

/// Shortest delay ever handed out, whatever the settings say.
pub(crate) const MIN_BACKOFF: Duration = Duration::from_millis(1);

/// Capped exponential backoff with upward jitter. Never returns less than
/// [`MIN_BACKOFF`] and never exceeds `max_backoff` (or the floor, if larger).
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    initial: Duration,
    max: Duration,
    factor: f64,
    random_factor: f64,
}

impl Backoff {
    pub(crate) fn new(settings: &ReconnectSettings) -> Self {
        let initial = settings.initial_backoff.max(MIN_BACKOFF);
        Self {
            initial,
            max: settings.max_backoff.max(initial),
            factor: settings.backoff_factor.max(1.0),
            random_factor: settings.random_factor.clamp(0.0, 1.0),
        }
    }

    /// Delay before the next attempt given the number of consecutive failed
    /// attempts so far.
    pub(crate) fn delay(&self, failed_attempts: u64) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(32) as i32;
        let max = self.max.as_secs_f64();
        let base = (self.initial.as_secs_f64() * self.factor.powi(exponent)).min(max);
        let jitter = if self.random_factor > 0.0 {
            rand::thread_rng().gen_range(0.0..=self.random_factor)
        } else {
            0.0
        };
        let delay = Duration::from_secs_f64((base * (1.0 + jitter)).min(max));
        delay.max(self.initial)
    }
}
