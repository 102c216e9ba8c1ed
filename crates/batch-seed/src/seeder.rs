//! The bounded batch seeder and its lazy run.

use std::fmt;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::SeedError;
use crate::memory::{MemoryProbe, MemorySample};
use crate::record::SeedRecord;
use crate::spec::SeedSpec;
use crate::store::{SeedStore, StoreError};

/// Emitted once per commit cycle.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// 1-based batch sequence number.
    pub batch: u64,
    /// Records committed by this batch.
    pub batch_len: usize,
    /// Records committed so far, this batch included.
    pub cumulative: u64,
    /// Memory observed after the batch was released.
    pub memory: MemorySample,
    /// Wall time of the commit cycle.
    pub elapsed: Duration,
}

/// Totals of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub kind: &'static str,
    /// Batches committed by this run.
    pub batches: u64,
    /// Cumulative committed count, including any resumed prefix.
    pub committed: u64,
    pub peak_memory_bytes: u64,
    pub elapsed: Duration,
}

type ReclaimHook = Box<dyn FnMut() + Send>;

/// Generates and persists records in fixed-size batches.
///
/// Peak memory stays bounded by the batch size: each batch is staged,
/// committed and released before the next one is generated.
pub struct BoundedBatchSeeder {
    probe: MemoryProbe,
    reclaim: Option<ReclaimHook>,
}

impl BoundedBatchSeeder {
    /// Creates a seeder that samples process memory after every batch.
    pub fn new() -> Self {
        Self {
            probe: MemoryProbe::new(),
            reclaim: None,
        }
    }

    /// Installs a best-effort reclamation hint called after every release.
    ///
    /// Correctness never depends on the hook; it only flattens peak memory,
    /// e.g. by asking an allocator to return freed pages.
    pub fn with_reclaim_hook(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.reclaim = Some(Box::new(hook));
        self
    }

    /// Reports zero memory instead of sampling the process.
    pub fn without_memory_probe(mut self) -> Self {
        self.probe = MemoryProbe::disabled();
        self
    }

    /// Validates `spec` and prepares a run against `store`.
    ///
    /// The store must have nothing staged; otherwise foreign records would
    /// be committed with the first batch and skew the committed count.
    ///
    /// Nothing is generated until [`SeedRun::next_batch`] is awaited. The
    /// store stays exclusively borrowed for the lifetime of the run.
    pub fn run<'s, R, F, S>(
        self,
        spec: SeedSpec<R, F>,
        store: &'s mut S,
    ) -> Result<SeedRun<'s, R, F, S>, SeedError>
    where
        R: SeedRecord,
        F: FnMut(u64, &mut StdRng) -> anyhow::Result<R>,
        S: SeedStore,
    {
        spec.validate()?;

        let staged = store.staged_len();
        if staged != 0 {
            return Err(SeedError::StoreBusy { staged });
        }

        info!(
            "Seeding {} {} records in {} batches of {}",
            spec.count() - spec.resume_point(),
            R::KIND,
            spec.batch_count(),
            spec.batch_size()
        );
        if spec.resume_point() > 0 {
            info!("  Resuming after {} committed records", spec.resume_point());
        }

        Ok(SeedRun {
            committed: spec.resume_point(),
            spec,
            store,
            probe: self.probe,
            reclaim: self.reclaim,
            batches: 0,
            finished: false,
            started: Instant::now(),
        })
    }
}

impl Default for BoundedBatchSeeder {
    fn default() -> Self {
        Self::new()
    }
}

/// A lazy, single-use seeding run.
///
/// Each call to [`SeedRun::next_batch`] performs one commit cycle. Dropping
/// the run between calls stops it cleanly at a batch boundary.
pub struct SeedRun<'s, R, F, S> {
    spec: SeedSpec<R, F>,
    store: &'s mut S,
    probe: MemoryProbe,
    reclaim: Option<ReclaimHook>,
    committed: u64,
    batches: u64,
    finished: bool,
    started: Instant,
}

impl<'s, R, F, S> SeedRun<'s, R, F, S>
where
    R: SeedRecord,
    F: FnMut(u64, &mut StdRng) -> anyhow::Result<R>,
    S: SeedStore,
{
    /// Runs the next commit cycle.
    ///
    /// Returns `None` once every record is committed, and after the first
    /// error; a failed run never resumes.
    pub async fn next_batch(&mut self) -> Option<Result<BatchReport, SeedError>> {
        if self.finished {
            return None;
        }

        let result = self.commit_cycle().await;
        match &result {
            Ok(_) => {
                self.batches += 1;
                if self.committed == self.spec.count() {
                    self.finished = true;
                }
            }
            Err(e) => {
                warn!("Aborting {} seeding run: {e}", R::KIND);
                self.finished = true;
            }
        }

        Some(result)
    }

    /// Drives the run to completion.
    pub async fn finish(mut self) -> Result<RunSummary, SeedError> {
        while let Some(report) = self.next_batch().await {
            report?;
        }

        let summary = self.summary();
        info!(
            "Seeded {} {} records in {} batches ({:.1?})",
            summary.committed, summary.kind, summary.batches, summary.elapsed
        );
        Ok(summary)
    }

    /// Totals so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            kind: R::KIND,
            batches: self.batches,
            committed: self.committed,
            peak_memory_bytes: self.probe.peak_bytes(),
            elapsed: self.started.elapsed(),
        }
    }

    /// The store, for re-resolving committed records between batches.
    pub fn store(&mut self) -> &mut S {
        &mut *self.store
    }

    /// Cumulative count of durably committed records.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    async fn commit_cycle(&mut self) -> Result<BatchReport, SeedError> {
        let started = Instant::now();
        let batch_size = self.spec.batch_size() as u64;
        let batch = self.committed / batch_size + 1;
        let end = (self.committed + batch_size).min(self.spec.count());
        let batch_len = (end - self.committed) as usize;

        let mut rng = self.spec.batch_rng(batch);
        for index in self.committed + 1..=end {
            let record = match self.spec.make(index, &mut rng) {
                Ok(record) => record,
                Err(source) => {
                    self.store.release();
                    return Err(SeedError::Factory { index, source });
                }
            };

            // The handle is dropped right away; the seeder keeps no references
            if let Err(source) = self.store.stage(record) {
                self.store.release();
                return Err(SeedError::Staging { index, source });
            }
        }

        debug!("Staged {} {} records for batch {}", batch_len, R::KIND, batch);

        let written = match self.store.commit().await {
            Ok(written) => written,
            Err(source) => {
                self.store.release();
                return Err(SeedError::CommitFailed {
                    batch,
                    committed: self.committed,
                    source,
                });
            }
        };

        if written != batch_len {
            self.store.release();
            return Err(SeedError::CommitFailed {
                batch,
                committed: self.committed,
                source: StoreError::commit(format!(
                    "store wrote {written} of {batch_len} staged records"
                )),
            });
        }

        self.committed = end;
        self.store.release();

        if let Some(hook) = self.reclaim.as_mut() {
            debug!("Running reclamation hook after batch {}", batch);
            hook();
        }

        let memory = self.probe.sample();

        info!(
            "  Committed batch {}: {}/{} {} records",
            batch,
            end,
            self.spec.count(),
            R::KIND
        );

        Ok(BatchReport {
            batch,
            batch_len,
            cumulative: end,
            memory,
            elapsed: started.elapsed(),
        })
    }
}

impl<R, F, S> fmt::Debug for SeedRun<'_, R, F, S>
where
    R: SeedRecord,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedRun")
            .field("spec", &self.spec)
            .field("committed", &self.committed)
            .field("batches", &self.batches)
            .field("finished", &self.finished)
            .finish()
    }
}
