//! Running latency statistics per stream
//!
//! Count, last, mean, min, and max are updated in place on every sample.
//! The mean uses the incremental form `avg += (x - avg) / n`, which stays
//! accurate over unlimited sessions where a running sum would not.

use super::stream::Stream;

/// Initial minimum, above any latency a measurement budget allows
pub const MIN_LATENCY_SENTINEL_MS: f64 = 99_999.0;

/// Running statistics for one stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    /// Recorded samples
    pub run_count: u32,
    /// Most recent latency (ms)
    pub last_latency: f64,
    /// Running mean (ms)
    pub avg_latency: f64,
    /// Minimum latency observed (ms)
    pub min_latency: f64,
    /// Maximum latency observed (ms)
    pub max_latency: f64,
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self {
            run_count: 0,
            last_latency: 0.0,
            avg_latency: 0.0,
            min_latency: MIN_LATENCY_SENTINEL_MS,
            max_latency: 0.0,
        }
    }
}

impl LatencyStats {
    /// Fold one sample into the statistics
    ///
    /// # Arguments
    /// * `latency_ms` - Latency in milliseconds
    pub fn record(&mut self, latency_ms: f64) {
        self.run_count += 1;
        self.last_latency = latency_ms;
        self.avg_latency += (latency_ms - self.avg_latency) / f64::from(self.run_count);
        if latency_ms < self.min_latency {
            self.min_latency = latency_ms;
        }
        if latency_ms > self.max_latency {
            self.max_latency = latency_ms;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True once at least one sample has been recorded
    pub fn has_samples(&self) -> bool {
        self.run_count > 0
    }
}

/// Default bound on samples awaiting persistence, per stream
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Append-only latency samples awaiting persistence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleLog {
    samples: Vec<f64>,
    /// Oldest samples discarded since the last clear
    dropped: u64,
}

impl SampleLog {
    /// Append a sample, discarding the oldest once `capacity` is reached
    ///
    /// # Returns
    /// True if a sample was discarded
    pub fn push(&mut self, latency_ms: f64, capacity: usize) -> bool {
        let overflow = self.samples.len() >= capacity;
        if overflow {
            self.samples.remove(0);
            self.dropped += 1;
        }
        self.samples.push(latency_ms);
        overflow
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.dropped = 0;
    }
}

/// Statistics and sample logs for every stream
#[derive(Debug, Clone)]
pub struct StatsStore {
    stats: [LatencyStats; Stream::COUNT],
    logs: [SampleLog; Stream::COUNT],
    /// Sample logs are only kept when persistence is available
    logging: bool,
    /// Per-stream bound on unflushed samples
    log_capacity: usize,
}

impl StatsStore {
    /// Create an empty store
    ///
    /// # Arguments
    /// * `logging` - Keep per-sample logs for persistence
    pub fn new(logging: bool) -> Self {
        Self {
            stats: [LatencyStats::default(); Stream::COUNT],
            logs: Default::default(),
            logging,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }

    /// Bound each stream's unflushed log; at least one sample is kept
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity.max(1);
        self
    }

    /// Record a latency measurement on a stream
    pub fn record(&mut self, stream: Stream, latency_ms: f64) {
        self.stats[stream.index()].record(latency_ms);
        if !self.logging {
            return;
        }
        let log = &mut self.logs[stream.index()];
        if log.push(latency_ms, self.log_capacity) && log.dropped() == 1 {
            tracing::warn!(
                stream = %stream,
                capacity = self.log_capacity,
                "sample_log_full_dropping_oldest"
            );
        }
    }

    /// Reset one stream's statistics and log
    pub fn reset(&mut self, stream: Stream) {
        self.stats[stream.index()].reset();
        self.logs[stream.index()].clear();
    }

    /// Reset every stream
    pub fn clear(&mut self) {
        for stream in Stream::ALL {
            self.reset(stream);
        }
    }

    pub fn stats(&self, stream: Stream) -> &LatencyStats {
        &self.stats[stream.index()]
    }

    pub fn log(&self, stream: Stream) -> &SampleLog {
        &self.logs[stream.index()]
    }

    /// Drop logged samples after a successful flush, keeping statistics
    pub fn clear_log(&mut self, stream: Stream) {
        self.logs[stream.index()].clear();
    }

    pub fn logging(&self) -> bool {
        self.logging
    }
}

impl Default for StatsStore {
    fn default() -> Self {
        Self::new(false)
    }
}
