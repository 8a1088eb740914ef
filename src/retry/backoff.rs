//! Exponential backoff with jitter.
//!
//! The delay after the `n`-th failed attempt is drawn uniformly from
//! `[min(initial, cap), cap]` where `cap = min(initial × 2^n, max)`. The base
//! is derived from the attempt number alone, so jitter never compounds.

use std::time::Duration;

use rand::Rng;

/// Delay to wait after `attempt` failed attempts.
///
/// Never shorter than `initial` (unless `max` is smaller) and never longer
/// than `max`.
pub fn next_backoff(attempt: u32, initial: Duration, max: Duration) -> Duration {
    let cap = initial
        .checked_mul(2_u32.saturating_pow(attempt))
        .map_or(max, |grown| grown.min(max));
    let floor = initial.min(cap);

    let lo = nanos(floor);
    let hi = nanos(cap);
    if lo >= hi {
        return cap;
    }

    Duration::from_nanos(rand::rng().random_range(lo..=hi))
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
