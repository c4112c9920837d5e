//! Randomised polling delay.
//!
//! Delays are drawn uniformly from `[base / 2, base)` so that several
//! watchers never poll in lockstep and the target never sees a perfectly
//! periodic client.

use rand::Rng;
use std::time::Duration;

/// Draw the next delay for a base interval, at millisecond resolution.
///
/// A zero base yields a zero delay; configuration validation rejects it
/// before the loop ever runs.
pub fn jittered_delay<R: Rng + ?Sized>(base: Duration, rng: &mut R) -> Duration {
    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    if base_ms == 0 {
        return Duration::ZERO;
    }
    let half = base_ms / 2;
    let width = base_ms - half;
    Duration::from_millis(half + rng.gen_range(0..width))
}
