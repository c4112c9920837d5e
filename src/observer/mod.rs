//! Periodic observation of one target.
//!
//! [`ObservationLoop`] runs the fetch/extract/compare/notify cycle and
//! sleeps a jittered delay between cycles until cancelled or stopped by a
//! fatal error.

pub mod jitter;
pub mod runner;

pub use jitter::jittered_delay;
pub use runner::{CycleOutcome, ObservationLoop};
