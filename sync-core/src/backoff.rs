//! Retry delay for failed drains.
//!
//! A failed drain never retries on its own; the client may schedule one
//! delayed re-attempt using this delay when automatic retry is enabled.

use std::time::Duration;

/// Calculate the delay before retry `attempt` (1-based), with jitter.
///
/// Uses exponential backoff with random jitter so that many clients coming
/// back online at once do not hit the remote in lockstep.
///
/// Formula: min(30s, 2^attempt seconds) + random(0..5000ms)
pub fn retry_delay(attempt: u32) -> Duration {
    base_delay(attempt) + Duration::from_millis(random_jitter_ms())
}

/// The deterministic part of [`retry_delay`].
pub fn base_delay(attempt: u32) -> Duration {
    let base_secs = 2u64.pow(attempt.min(5)).min(30);
    Duration::from_secs(base_secs)
}

/// Generate random jitter between 0 and 5000 milliseconds.
///
/// Falls back to no jitter if the OS random source is unavailable.
fn random_jitter_ms() -> u64 {
    let mut bytes = [0u8; 8];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes) % 5001,
        Err(_) => 0,
    }
}
