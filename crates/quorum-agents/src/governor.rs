use std::time::{Duration, Instant};

use quorum_models::GovernorConfig;

use crate::error::ProviderError;

/// Deadline used when `now + backoff` is past what an `Instant` can hold.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Whether a call may be attempted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Open,
    Cooling { remaining: Duration },
}

/// Per-agent adaptive backoff against provider rate limits.
///
/// Two states: Open (calls permitted) and Cooling (calls suppressed until a
/// deadline). Only a `RateLimited` failure advances the backoff; a single
/// success resets the consecutive-error count to zero. Each agent owns its
/// governor exclusively, so one exhausted provider never blocks another agent.
#[derive(Debug, Clone)]
pub struct Governor {
    base_backoff: Duration,
    max_backoff: Duration,
    consecutive_errors: u32,
    cool_until: Option<Instant>,
}

impl Default for Governor {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(120))
    }
}

impl Governor {
    pub fn new(base_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            base_backoff,
            max_backoff,
            consecutive_errors: 0,
            cool_until: None,
        }
    }

    pub fn from_config(config: &GovernorConfig) -> Self {
        Self::new(
            Duration::from_secs(config.base_backoff_seconds),
            Duration::from_secs(config.max_backoff_seconds),
        )
    }

    pub fn gate(&self, now: Instant) -> GateState {
        match self.cool_until {
            Some(until) if now < until => GateState::Cooling {
                remaining: until - now,
            },
            _ => GateState::Open,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
        self.cool_until = None;
    }

    /// Apply a failed call. Returns the cooldown started, if the failure was a rate limit.
    pub fn record_failure(&mut self, error: &ProviderError, now: Instant) -> Option<Duration> {
        if !matches!(error, ProviderError::RateLimited(_)) {
            return None;
        }
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        let backoff = self.backoff_for(self.consecutive_errors);
        self.cool_until = Some(
            now.checked_add(backoff)
                .or_else(|| now.checked_add(FAR_FUTURE))
                .unwrap_or(now),
        );
        Some(backoff)
    }

    /// Cooldown after the `errors`-th consecutive rate limit: `min(base * 2^(errors-1), max)`.
    pub fn backoff_for(&self, errors: u32) -> Duration {
        if errors == 0 {
            return Duration::ZERO;
        }
        1u32.checked_shl(errors - 1)
            .and_then(|factor| self.base_backoff.checked_mul(factor))
            .map_or(self.max_backoff, |backoff| backoff.min(self.max_backoff))
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn cool_until(&self) -> Option<Instant> {
        self.cool_until
    }
}
