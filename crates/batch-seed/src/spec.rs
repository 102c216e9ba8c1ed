//! Description of one seeding run.

use std::fmt;
use std::marker::PhantomData;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::SeedError;
use crate::record::SeedRecord;

/// Multiplier used to spread batch indices across the seed space.
const BATCH_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Describes one class of entity to generate.
///
/// The factory receives the 1-based record index and a seeded RNG and
/// returns one record. Factory errors abort the run.
pub struct SeedSpec<R, F> {
    count: u64,
    batch_size: usize,
    factory: F,
    seed: u64,
    resume_after: u64,
    _record: PhantomData<fn() -> R>,
}

impl<R, F> SeedSpec<R, F>
where
    R: SeedRecord,
    F: FnMut(u64, &mut StdRng) -> anyhow::Result<R>,
{
    /// Creates a spec for `count` records committed `batch_size` at a time.
    pub fn new(count: u64, batch_size: usize, factory: F) -> Self {
        Self {
            count,
            batch_size,
            factory,
            seed: 0,
            resume_after: 0,
            _record: PhantomData,
        }
    }

    /// Sets the RNG seed (for reproducible data).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Skips the first `committed` records.
    ///
    /// Used to restart after a failed run: pass the cumulative count carried
    /// by [`SeedError::CommitFailed`]. Must fall on a batch boundary.
    pub fn resume_after(mut self, committed: u64) -> Self {
        self.resume_after = committed;
        self
    }

    /// Checks the count and batch-size constraints.
    pub fn validate(&self) -> Result<(), SeedError> {
        if self.count == 0 {
            return Err(SeedError::InvalidSpec(
                "count must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(SeedError::InvalidSpec(
                "batch size must be greater than zero".to_string(),
            ));
        }
        if self.batch_size as u64 > self.count {
            return Err(SeedError::InvalidSpec(format!(
                "batch size {} exceeds count {}",
                self.batch_size, self.count
            )));
        }
        if self.resume_after >= self.count {
            return Err(SeedError::InvalidSpec(format!(
                "cannot resume after {} of {} records",
                self.resume_after, self.count
            )));
        }
        if self.resume_after % self.batch_size as u64 != 0 {
            return Err(SeedError::InvalidSpec(format!(
                "resume point {} is not a multiple of batch size {}",
                self.resume_after, self.batch_size
            )));
        }
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn resume_point(&self) -> u64 {
        self.resume_after
    }

    /// Number of commit cycles this spec produces.
    pub fn batch_count(&self) -> u64 {
        (self.count - self.resume_after).div_ceil(self.batch_size as u64)
    }

    /// RNG for the 1-based batch `batch`.
    ///
    /// Reseeding per batch keeps records stable across resumed runs.
    pub(crate) fn batch_rng(&self, batch: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ batch.wrapping_mul(BATCH_SEED_STRIDE))
    }

    pub(crate) fn make(&mut self, index: u64, rng: &mut StdRng) -> anyhow::Result<R> {
        (self.factory)(index, rng)
    }
}

impl<R, F> fmt::Debug for SeedSpec<R, F>
where
    R: SeedRecord,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedSpec")
            .field("kind", &R::KIND)
            .field("count", &self.count)
            .field("batch_size", &self.batch_size)
            .field("seed", &self.seed)
            .field("resume_after", &self.resume_after)
            .finish()
    }
}
