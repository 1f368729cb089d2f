//! Parallel batch search over all lanes

use crate::core::lane::{search_lane, SearchBatch};
use crate::core::{BlockTemplate, Nonce};
use crate::error::{Error, Result};
use rayon::prelude::*;
use tracing::debug;

/// Outcome of one batch, produced once by the reduction step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningResult {
    pub found: bool,
    pub nonce: Nonce,
    pub digest: [u8; 32],
    /// Hashes attempted. Exact when exhausted, an upper bound when found.
    pub hashes: u64,
}

impl MiningResult {
    fn found(nonce: Nonce, digest: [u8; 32], hashes: u64) -> Self {
        Self {
            found: true,
            nonce,
            digest,
            hashes,
        }
    }

    fn exhausted(hashes: u64) -> Self {
        Self {
            found: false,
            nonce: Nonce::default(),
            digest: [0u8; 32],
            hashes,
        }
    }

    /// The winning nonce and digest, if any
    pub fn solution(&self) -> Option<(Nonce, [u8; 32])> {
        self.found.then_some((self.nonce, self.digest))
    }
}

/// Fans a batch out over a dedicated rayon pool
pub struct SearchCoordinator {
    pool: rayon::ThreadPool,
}

impl SearchCoordinator {
    /// Build the lane pool (`threads == 0` means one thread per CPU)
    pub fn new(threads: usize) -> Result<Self> {
        let threads = if threads == 0 { num_cpus::get() } else { threads };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("lane-worker-{}", index))
            .build()
            .map_err(|e| Error::config(format!("Failed to build lane pool: {}", e)))?;

        debug!("Lane pool ready with {} threads", threads);
        Ok(Self { pool })
    }

    /// Number of threads lanes are scheduled on
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `lane_count` lanes from `start`, each for `iteration_budget` candidates.
    ///
    /// Lane `i` tries `start + i + k * lane_count`. Every lane hashes its own
    /// copy of the message block. When several lanes succeed, whichever the
    /// pool reports first wins.
    pub fn run_batch(
        &self,
        template: &BlockTemplate,
        start: u64,
        lane_count: u32,
        iteration_budget: u64,
    ) -> MiningResult {
        let difficulty = template.difficulty();
        let stride = u64::from(lane_count);
        let hashes = stride.saturating_mul(iteration_budget);

        let winner = self.pool.install(|| {
            (0..lane_count).into_par_iter().find_map_any(|lane_id| {
                let mut block = template.message_block();
                let batch = SearchBatch::new(start, stride, lane_id, iteration_budget);
                search_lane(&mut block, &batch, difficulty)
            })
        });

        match winner {
            Some((nonce, digest)) => MiningResult::found(nonce, digest, hashes),
            None => MiningResult::exhausted(hashes),
        }
    }
}

impl std::fmt::Debug for SearchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCoordinator")
            .field("threads", &self.threads())
            .finish()
    }
}
