//! Latency measurement engine
//!
//! - Threshold-crossing step function ([`edge`])
//! - Timed click-to-crossing measurement ([`latency`])
//! - Interruptible polling waits ([`wait`])
//! - Baseline sync and warm-up ([`sync`])
//! - Jittered inter-run delays ([`jitter`])
//!
//! Every wait is a polling loop over a pure step so it can run against the
//! simulated clock and sensor. Only the timed measurement skips the button
//! check.

pub mod edge;
pub mod jitter;
pub mod latency;
pub mod sync;
pub mod wait;
