//! Run statistics with atomic counters.
//!
//! This module provides [`RunStats`] for counting outcomes while a run is in
//! flight and [`RunStatsSnapshot`] for the point-in-time view a report
//! carries.
//!
//! # Thread Safety
//!
//! All counters use [`AtomicU64`] with [`Relaxed`](std::sync::atomic::Ordering::Relaxed)
//! ordering. The values are informational and don't require strict ordering
//! guarantees.
//!
//! # Examples
//!
//! ```
//! use xc_scanner::RunStats;
//!
//! let stats = RunStats::new();
//! stats.increment_processed();
//! stats.increment_cache_hits();
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.processed, 1);
//! assert_eq!(snapshot.cache_hits, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use xc_ts_parser::ParseCounters;

/// Atomic counters for one extraction run.
#[derive(Debug, Default)]
pub struct RunStats {
    /// Files extracted, from the cache or otherwise.
    processed: AtomicU64,
    /// Files that could not be read or whose extraction failed.
    error_files: AtomicU64,
    /// Structured parses that produced a tree with syntax errors.
    parse_errors: AtomicU64,
    /// Structured parses that exceeded their budget.
    parse_timeouts: AtomicU64,
    /// Files answered from the content-hash cache.
    cache_hits: AtomicU64,
}

impl RunStats {
    /// Creates a new [`RunStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the processed files counter.
    #[inline]
    pub fn increment_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the error files counter.
    #[inline]
    pub fn increment_error_files(&self) {
        self.error_files.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the cache hit counter.
    #[inline]
    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds a parser's failure counters.
    #[inline]
    pub fn add_parse_counters(&self, counters: ParseCounters) {
        self.parse_errors
            .fetch_add(counters.parse_errors, Ordering::Relaxed);
        self.parse_timeouts
            .fetch_add(counters.parse_timeouts, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            error_files: self.error_files.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            parse_timeouts: self.parse_timeouts.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.processed.store(0, Ordering::Relaxed);
        self.error_files.store(0, Ordering::Relaxed);
        self.parse_errors.store(0, Ordering::Relaxed);
        self.parse_timeouts.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of run statistics.
///
/// # Examples
///
/// ```
/// use xc_scanner::RunStatsSnapshot;
///
/// let snap = RunStatsSnapshot {
///     processed: 95,
///     error_files: 5,
///     ..Default::default()
/// };
/// assert_eq!(snap.total(), 100);
/// assert!((snap.success_rate() - 95.0).abs() < 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunStatsSnapshot {
    /// Files extracted, from the cache or otherwise.
    pub processed: u64,
    /// Files that could not be read or whose extraction failed.
    pub error_files: u64,
    /// Structured parses that produced a tree with syntax errors.
    pub parse_errors: u64,
    /// Structured parses that exceeded their budget.
    pub parse_timeouts: u64,
    /// Files answered from the content-hash cache.
    pub cache_hits: u64,
}

impl RunStatsSnapshot {
    /// Returns the number of files the run attempted.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.processed + self.error_files
    }

    /// Returns the share of attempted files that were extracted, as a
    /// percentage. Returns 100.0 for an empty run.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Acceptable for statistics display
    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 100.0;
        }
        (self.processed as f64 / total as f64) * 100.0
    }

    /// Returns the share of processed files answered from the cache, as a
    /// percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cache_hit_percent(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        (self.cache_hits as f64 / self.processed as f64) * 100.0
    }
}
