//! Distribution of per-file extraction across workers.
//!
//! # Architecture
//!
//! ```text
//!  paths ──► worker pool (rayon) ──► FileMessage ──► coordinator ──► Inventory
//!            one FileExtractor        crossbeam        single owner
//!            per worker thread        channel          of all state
//! ```
//!
//! Workers receive a path, read the file, consult the [`ExtractionCache`] and
//! run a [`FileExtractor`]. They send back an owned [`FileMessage`] and never
//! touch the inventory. The coordinator counts outcomes as messages arrive,
//! then folds the extractions into the inventory in input order, so the
//! result does not depend on which worker finished first.
//!
//! Small inputs, or runs with `parallel` off, skip the pool and run the same
//! worker in the calling thread.

use std::panic::{AssertUnwindSafe, catch_unwind};

use camino::{Utf8Path, Utf8PathBuf};
use crossbeam_channel as channel;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use xc_core::AnalyzerConfig;
use xc_ts_parser::{ExtractionRules, FileExtraction, FileExtractor, ParseCounters, ParseFailure};

use crate::cache::ExtractionCache;
use crate::error::ScanError;
use crate::inventory::Inventory;
use crate::stats::RunStats;

/// The result of extracting one file, sent from a worker to the coordinator.
#[derive(Debug)]
pub struct FileMessage {
    /// Position of the file in the input list.
    pub index: usize,
    /// The file.
    pub path: Utf8PathBuf,
    /// What was extracted, or why nothing was.
    pub outcome: Result<Extracted, ScanError>,
}

/// A successful per-file extraction.
#[derive(Debug)]
pub struct Extracted {
    /// The entities.
    pub extraction: FileExtraction,
    /// Whether the entities came from the cache.
    pub cached: bool,
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct Collected {
    /// Merged entities.
    pub inventory: Inventory,
    /// Files that could not be extracted, in input order.
    pub errors: Vec<(Utf8PathBuf, ScanError)>,
}

/// Per-thread extraction state.
///
/// The extractor is created on first use and dropped after a panic, so the
/// next file gets a fresh parser.
struct Worker<'a> {
    rules: &'a ExtractionRules,
    config: &'a AnalyzerConfig,
    cache: Option<&'a ExtractionCache>,
    extractor: Option<FileExtractor>,
}

impl<'a> Worker<'a> {
    const fn new(
        rules: &'a ExtractionRules,
        config: &'a AnalyzerConfig,
        cache: Option<&'a ExtractionCache>,
    ) -> Self {
        Self {
            rules,
            config,
            cache,
            extractor: None,
        }
    }

    fn process(&mut self, index: usize, path: &Utf8Path) -> FileMessage {
        FileMessage {
            index,
            path: path.to_owned(),
            outcome: self.extract(path),
        }
    }

    fn extract(&mut self, path: &Utf8Path) -> Result<Extracted, ScanError> {
        let text = std::fs::read_to_string(path).map_err(|e| ScanError::read(path, e))?;

        let key = self
            .cache
            .map(|_| ExtractionCache::key(self.rules, self.config, path, &text));
        let hit = match (self.cache, key.as_deref()) {
            (Some(cache), Some(key)) => cache.get(key),
            _ => None,
        };
        if let Some(mut extraction) = hit {
            extraction.relocate(path);
            return Ok(Extracted {
                extraction,
                cached: true,
            });
        }

        let mut extractor = match self.extractor.take() {
            Some(extractor) => extractor,
            None => FileExtractor::new(self.rules.clone(), self.config)?,
        };

        let extraction = catch_unwind(AssertUnwindSafe(|| extractor.extract(path, &text)))
            .map_err(|payload| ScanError::extract(path, panic_message(payload.as_ref())))?;
        self.extractor = Some(extractor);

        if let (Some(cache), Some(key)) = (self.cache, key) {
            cache.insert(key, extraction.clone());
        }
        Ok(Extracted {
            extraction,
            cached: false,
        })
    }
}

/// Runs extraction over `paths` and merges the results.
///
/// Uses the pool when `config.parallel` is set and there are at least
/// `config.parallel_threshold` files.
pub fn run(
    paths: &[Utf8PathBuf],
    rules: &ExtractionRules,
    config: &AnalyzerConfig,
    cache: Option<&ExtractionCache>,
    stats: &RunStats,
) -> Result<Collected, ScanError> {
    let workers = worker_count(config, paths.len());
    if !config.parallel || paths.len() < config.parallel_threshold || workers < 2 {
        debug!(files = paths.len(), "Extracting sequentially");
        return Ok(run_sequential(paths, rules, config, cache, stats));
    }
    run_parallel(paths, rules, config, cache, stats, workers)
}

/// Runs every file through one worker in the calling thread.
pub fn run_sequential(
    paths: &[Utf8PathBuf],
    rules: &ExtractionRules,
    config: &AnalyzerConfig,
    cache: Option<&ExtractionCache>,
    stats: &RunStats,
) -> Collected {
    let mut worker = Worker::new(rules, config, cache);
    let mut coordinator = Coordinator::new(paths, config, stats);
    for (index, path) in paths.iter().enumerate() {
        coordinator.receive(worker.process(index, path));
    }
    coordinator.finish()
}

/// Runs files on a pool of `workers` threads; the calling thread coordinates.
pub fn run_parallel(
    paths: &[Utf8PathBuf],
    rules: &ExtractionRules,
    config: &AnalyzerConfig,
    cache: Option<&ExtractionCache>,
    stats: &RunStats,
    workers: usize,
) -> Result<Collected, ScanError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("xc-worker-{i}"))
        .build()?;
    info!(files = paths.len(), workers, "Extracting in parallel");

    let (tx, rx) = channel::unbounded::<FileMessage>();
    let mut coordinator = Coordinator::new(paths, config, stats);

    std::thread::scope(|scope| {
        let producer = scope.spawn(move || {
            pool.install(|| {
                paths.par_iter().enumerate().for_each_init(
                    || (Worker::new(rules, config, cache), tx.clone()),
                    |(worker, tx), (index, path)| {
                        // The coordinator outlives every sender.
                        let _ = tx.send(worker.process(index, path));
                    },
                );
            });
        });

        for message in &rx {
            coordinator.receive(message);
        }

        if producer.join().is_err() {
            warn!("Worker pool exited abnormally");
        }
    });

    Ok(coordinator.finish())
}

/// Returns `min(max_workers, cores, files)`, at least one.
#[must_use]
pub fn worker_count(config: &AnalyzerConfig, files: usize) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    config.max_workers.min(cores).min(files).max(1)
}

/// Single consumer of worker messages.
struct Coordinator<'a> {
    paths: &'a [Utf8PathBuf],
    stats: &'a RunStats,
    progress_interval: usize,
    completed: usize,
    slots: Vec<Option<Result<FileExtraction, ScanError>>>,
}

impl<'a> Coordinator<'a> {
    fn new(paths: &'a [Utf8PathBuf], config: &AnalyzerConfig, stats: &'a RunStats) -> Self {
        Self {
            paths,
            stats,
            progress_interval: config.progress_interval.max(1),
            completed: 0,
            slots: std::iter::repeat_with(|| None).take(paths.len()).collect(),
        }
    }

    fn receive(&mut self, message: FileMessage) {
        let FileMessage {
            index,
            path,
            outcome,
        } = message;

        let slot = match outcome {
            Ok(Extracted { extraction, cached }) => {
                self.stats.increment_processed();
                if cached {
                    self.stats.increment_cache_hits();
                }
                self.stats
                    .add_parse_counters(parse_counters(extraction.parse_failure));
                debug!(
                    %path,
                    endpoints = extraction.endpoints.len(),
                    models = extraction.models.len(),
                    components = extraction.components.len(),
                    cached,
                    "Extracted file"
                );
                Ok(extraction)
            }
            Err(e) => {
                self.stats.increment_error_files();
                warn!(%path, error = %e, "Failed to extract file");
                Err(e)
            }
        };
        if let Some(entry) = self.slots.get_mut(index) {
            *entry = Some(slot);
        }

        self.completed += 1;
        if self.completed % self.progress_interval == 0 {
            info!(
                completed = self.completed,
                total = self.paths.len(),
                "Extraction progress"
            );
        }
    }

    fn finish(self) -> Collected {
        let mut collected = Collected::default();
        for (path, slot) in self.paths.iter().zip(self.slots) {
            match slot {
                Some(Ok(extraction)) => collected.inventory.absorb(extraction),
                Some(Err(e)) => collected.errors.push((path.clone(), e)),
                None => {
                    self.stats.increment_error_files();
                    warn!(%path, "No result received for file");
                    let error = ScanError::extract(path, "worker exited before reporting");
                    collected.errors.push((path.clone(), error));
                }
            }
        }
        collected
    }
}

fn parse_counters(failure: Option<ParseFailure>) -> ParseCounters {
    ParseCounters {
        parse_errors: u64::from(failure == Some(ParseFailure::Syntax)),
        parse_timeouts: u64::from(failure == Some(ParseFailure::Timeout)),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "extractor panicked".to_owned())
}
