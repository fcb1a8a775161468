//! Retry with exponential backoff for transient gateway overload
//!
//! The hosted model intermittently sheds load; those failures announce
//! themselves in the error message and are worth a bounded number of
//! retries. Anything else propagates immediately.
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, return result
//! 3. If failure message matches a transient-overload marker:
//!    a. If attempts remain: log WARN, sleep, double the delay, retry
//!    b. If attempts exhausted: return the last error
//! 4. If other failure: return the error immediately (no retry)

use std::fmt::Display;
use std::time::Duration;

/// Message fragments that identify a transient-overload failure
const TRANSIENT_MARKERS: [&str; 3] = ["503", "overloaded", "unavailable"];

/// Whether an error message indicates transient overload worth retrying
pub fn is_transient_overload(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker))
}

/// Retry an async operation with exponential backoff on transient overload.
///
/// At most `max_retries` total attempts are made (so at most
/// `max_retries - 1` retries after the first try). The delay sequence is
/// `initial_delay, 2 * initial_delay, 4 * initial_delay, ...`; the sleep is
/// a scheduler suspension and never blocks other work. Carries no knowledge
/// of what the operation does.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "requirement analysis")
/// * `max_retries` - Total attempt cap, clamped to at least 1
/// * `initial_delay` - Delay before the first retry, doubled per retry
/// * `operation` - Async closure performing one attempt
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation_name: &str,
    max_retries: u32,
    initial_delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_retries.max(1);
    let mut delay = initial_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_transient_overload(&err.to_string()) {
                    // Non-transient failure, fail immediately
                    return Err(err);
                }

                if attempt >= max_attempts {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Operation failed: retries exhausted"
                    );
                    return Err(err);
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Model overloaded, will retry after backoff"
                );

                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}
