use crate::domain::entities::SyncMeta;
use crate::shared::config::SyncConfig;
use chrono::{DateTime, Duration, Utc};

/// How a sync run was started. Manual runs are an explicit "try again now"
/// and bypass the retry policy entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Automatic,
    Manual,
}

/// Bounds automatic retries: exponential backoff between attempts and a cap
/// after which the record waits for a manual trigger instead of being
/// retried on every connectivity event.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::seconds(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_backoff: Duration::seconds(config.backoff_secs.min(i64::MAX as u64) as i64),
        }
    }

    pub fn should_attempt(
        &self,
        meta: &SyncMeta,
        trigger: SyncTrigger,
        now: DateTime<Utc>,
    ) -> bool {
        if trigger == SyncTrigger::Manual {
            return true;
        }
        if meta.attempts == 0 {
            return true;
        }
        if meta.attempts >= self.max_attempts {
            return false;
        }
        match meta.last_attempt_at {
            Some(last) => now >= last + self.backoff_for(meta.attempts),
            None => true,
        }
    }

    /// Doubles per failed attempt, capped so the window never overflows.
    pub fn backoff_for(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(10);
        self.base_backoff * 2_i32.pow(exponent)
    }
}
