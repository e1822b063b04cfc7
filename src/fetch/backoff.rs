//! Retry policy for the transparency platform.
//!
//! The retry loop is driven by [`BackoffState`], a value type whose
//! [`BackoffState::advance`] transition is pure: it decides the next wait
//! without sleeping, so timing can be asserted directly.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Failures surfaced by [`super::fetch_text`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A non-retriable HTTP status (anything but 2xx, 429 and 5xx).
    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("invalid request url {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
        }
    }
}

/// Position in the retry sequence: the 1-based attempt about to be (or just)
/// made, and the computed delay to use if it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffState {
    pub attempt: u32,
    pub delay: Duration,
}

/// Outcome of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Retry { wait: Duration, next: BackoffState },
    GiveUp { attempts: u32 },
}

impl BackoffState {
    pub fn initial(policy: &BackoffPolicy) -> Self {
        Self {
            attempt: 1,
            delay: policy.initial_delay,
        }
    }

    /// Moves past a failed attempt. A server-supplied `retry_after` replaces
    /// the computed wait for this step only; the exponential delay still
    /// doubles underneath it.
    pub fn advance(self, policy: &BackoffPolicy, retry_after: Option<Duration>) -> Transition {
        if self.attempt >= policy.max_attempts {
            return Transition::GiveUp {
                attempts: self.attempt,
            };
        }

        Transition::Retry {
            wait: retry_after.unwrap_or(self.delay),
            next: BackoffState {
                attempt: self.attempt + 1,
                delay: self.delay.saturating_mul(2),
            },
        }
    }
}

/// 429 and 5xx are worth another try; every other non-success status is final.
pub fn is_retriable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Reads `Retry-After` in its delta-seconds form. HTTP-date values are ignored.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
