/*!
 * Retry policies with exponential backoff.
 *
 * Rate-limit failures back off from `rate_limit_base_ms`, all other failures
 * from `error_base_ms`; both are capped. Token-limit failures on a policy with
 * `shrink_on_token_limit` retry immediately with a shortened input.
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Inputs longer than this many characters are shortened on token-limit errors
pub const SHRINK_THRESHOLD_CHARS: usize = 100;

/// Fraction of the input kept when shortening
pub const SHRINK_RATIO: f64 = 0.8;

/// Backoff and attempt budget for one request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Base wait after a rate-limit failure
    pub rate_limit_base_ms: u64,

    /// Cap on the rate-limit wait
    pub rate_limit_cap_ms: u64,

    /// Base wait after any other failure
    pub error_base_ms: u64,

    /// Cap on the other-failure wait
    pub error_cap_ms: u64,

    /// Shorten the input and retry without waiting on token-limit errors
    #[serde(default)]
    pub shrink_on_token_limit: bool,
}

impl RetryPolicy {
    /// Policy for composite batch requests: 3 attempts
    pub const fn batch() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_base_ms: 2000,
            rate_limit_cap_ms: 15_000,
            error_base_ms: 1000,
            error_cap_ms: 8000,
            shrink_on_token_limit: false,
        }
    }

    /// Policy for single-line requests: 5 attempts and input shrinking
    pub const fn single_line() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_base_ms: 3000,
            rate_limit_cap_ms: 20_000,
            error_base_ms: 1500,
            error_cap_ms: 10_000,
            shrink_on_token_limit: true,
        }
    }

    /// Wait after the rate-limited failure of zero-based attempt `attempt`
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(backoff(self.rate_limit_base_ms, attempt, self.rate_limit_cap_ms))
    }

    /// Wait after any other failure of zero-based attempt `attempt`
    pub fn error_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(backoff(self.error_base_ms, attempt.saturating_add(1), self.error_cap_ms))
    }
}

fn backoff(base_ms: u64, exponent: u32, cap_ms: u64) -> u64 {
    let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor).min(cap_ms)
}

/// Keep the first 80% of the characters of inputs longer than the threshold
pub fn shrink_text(text: &str) -> String {
    let len = text.chars().count();
    if len <= SHRINK_THRESHOLD_CHARS {
        return text.to_string();
    }
    let keep = (len as f64 * SHRINK_RATIO).floor() as usize;
    text.chars().take(keep).collect()
}

/// Sleep for `duration` unless `cancel` fires first
///
/// Returns `false` when the sleep was interrupted by cancellation.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
