mod client;
mod basic;
pub mod auth;
pub mod backoff;
#[cfg(test)]
pub(crate) mod mock;

pub use client::HttpClient;
pub use basic::BasicClient;
pub use backoff::{BackoffPolicy, FetchError};

use backoff::{BackoffState, Transition, is_retriable, retry_after};
use std::time::Duration;
use tracing::{debug, warn};

/// Performs one logical GET, retrying throttling, server errors and
/// transport failures according to `policy`, and returns the body text.
///
/// # Errors
///
/// [`FetchError::Status`] for a non-retriable status, [`FetchError::Exhausted`]
/// once the attempt ceiling is reached.
pub async fn fetch_text<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    policy: &BackoffPolicy,
) -> Result<String, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let mut state = BackoffState::initial(policy);

    loop {
        let req = reqwest::Request::new(reqwest::Method::GET, parsed.clone());

        let (last, server_wait): (String, Option<Duration>) = match client.execute(req).await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => {
                    debug!(attempt = state.attempt, bytes = body.len(), "Request succeeded");
                    return Ok(body);
                }
                Err(e) => (format!("failed to read response body: {e}"), None),
            },
            Ok(resp) if is_retriable(resp.status()) => {
                let status = resp.status();
                let wait = retry_after(resp.headers());
                (format!("status {status}"), wait)
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(FetchError::Status { status, body });
            }
            Err(e) => (format!("transport error: {e}"), None),
        };

        match state.advance(policy, server_wait) {
            Transition::Retry { wait, next } => {
                warn!(
                    attempt = state.attempt,
                    max_attempts = policy.max_attempts,
                    wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                    reason = %last,
                    "Request failed, backing off"
                );
                tokio::time::sleep(wait).await;
                state = next;
            }
            Transition::GiveUp { attempts } => {
                return Err(FetchError::Exhausted { attempts, last });
            }
        }
    }
}
