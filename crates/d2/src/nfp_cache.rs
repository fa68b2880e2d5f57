//! NFP cache and the worker pool that fills it.
//!
//! The cache is append-only within one configuration: an entry is inserted
//! once and never overwritten. A batch of jobs is computed on a bounded rayon
//! pool and written back only after every job has finished.

use crate::clipper::Clipper;
use crate::nfp::{compute_nfp, Nfp, NfpJob, NfpKey, NfpOptions};
use polynest_core::{Config, Error, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe store of computed NFPs.
#[derive(Debug, Default)]
pub struct NfpCache {
    cache: RwLock<HashMap<NfpKey, Arc<Nfp>>>,
}

impl NfpCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached NFP for `key`.
    pub fn get(&self, key: &NfpKey) -> Option<Arc<Nfp>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(key).cloned()
    }

    /// Returns true if `key` has an entry.
    pub fn contains(&self, key: &NfpKey) -> bool {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.contains_key(key)
    }

    /// Inserts `nfp` unless `key` already has an entry. Returns true on insert.
    pub fn insert(&self, key: NfpKey, nfp: Nfp) -> bool {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache.contains_key(&key) {
            return false;
        }
        cache.insert(key, Arc::new(nfp));
        true
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.clear();
    }
}

/// Outcome of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Jobs whose key was already cached or repeated within the batch.
    pub cached: usize,
    /// Jobs computed and stored.
    pub computed: usize,
    /// Jobs that failed or panicked and were stored as empty.
    pub failed: usize,
}

/// Bounded worker pool computing NFP batches.
pub struct NfpWorkers {
    pool: ThreadPool,
    clipper: Clipper,
    options: NfpOptions,
}

impl std::fmt::Debug for NfpWorkers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NfpWorkers")
            .field("threads", &self.pool.current_num_threads())
            .field("options", &self.options)
            .finish()
    }
}

impl NfpWorkers {
    /// Builds a pool of `config.threads` workers (0 = available parallelism).
    pub fn new(config: &Config) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("polynest-nfp-{i}"))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build NFP worker pool: {e}")))?;

        Ok(Self {
            pool,
            clipper: Clipper::new(config),
            options: NfpOptions::from_config(config),
        })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Computes every uncached job and stores the results.
    pub fn resolve_batch(&self, cache: &NfpCache, jobs: Vec<NfpJob>) -> BatchReport {
        let clipper = self.clipper;
        let options = self.options;
        self.resolve_batch_with(cache, jobs, move |job| compute_nfp(job, &clipper, &options))
    }

    /// Like [`NfpWorkers::resolve_batch`] with a custom computation.
    ///
    /// Results are stored with every loop normalized to non-positive area. A
    /// job that returns an error or panics is stored as an empty NFP; the
    /// other jobs of the batch are unaffected.
    pub fn resolve_batch_with<F>(&self, cache: &NfpCache, jobs: Vec<NfpJob>, compute: F) -> BatchReport
    where
        F: Fn(&NfpJob) -> Result<Nfp> + Sync,
    {
        let mut report = BatchReport::default();
        let mut seen = HashSet::with_capacity(jobs.len());
        let pending: Vec<NfpJob> = jobs
            .into_iter()
            .filter(|job| {
                let fresh = !cache.contains(&job.key) && seen.insert(job.key);
                if !fresh {
                    report.cached += 1;
                }
                fresh
            })
            .collect();

        if pending.is_empty() {
            return report;
        }

        let results: Vec<(NfpKey, Option<Nfp>)> = self.pool.install(|| {
            pending
                .par_iter()
                .map(|job| {
                    let nfp = match catch_unwind(AssertUnwindSafe(|| compute(job))) {
                        Ok(Ok(nfp)) => Some(nfp),
                        Ok(Err(e)) => {
                            log::warn!("NFP {:?} failed: {}", job.key, e);
                            None
                        }
                        Err(_) => {
                            log::warn!("NFP {:?} panicked", job.key);
                            None
                        }
                    };
                    (job.key, nfp)
                })
                .collect()
        });

        for (key, nfp) in results {
            match nfp {
                Some(nfp) => {
                    report.computed += 1;
                    cache.insert(key, nfp.normalized());
                }
                None => {
                    report.failed += 1;
                    cache.insert(key, Nfp::new());
                }
            }
        }

        log::debug!(
            "NFP batch: {} computed, {} failed, {} cached",
            report.computed,
            report.failed,
            report.cached
        );
        report
    }
}
