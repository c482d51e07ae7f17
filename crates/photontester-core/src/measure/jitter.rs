//! Jittered inter-run delays
//!
//! A fixed delay between runs can phase-lock with the frame cadence of the
//! system under test and bias every sample the same way. Each delay is
//! drawn uniformly from `base ± spread`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded delay generator
#[derive(Debug, Clone)]
pub struct Jitter {
    rng: StdRng,
}

impl Jitter {
    /// Create a generator from an externally supplied seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next delay in `[base - spread, base + spread]`, floored at zero
    pub fn delay_ms(&mut self, base_ms: u64, spread_ms: u64) -> u64 {
        if spread_ms == 0 {
            return base_ms;
        }
        let low = base_ms.saturating_sub(spread_ms);
        let high = base_ms.saturating_add(spread_ms);
        self.rng.gen_range(low..=high)
    }
}
