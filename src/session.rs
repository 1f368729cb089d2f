//! Mining session: one template searched batch by batch
//!
//! A session walks `Idle → Searching → (Found | Exhausted) → Polling →
//! (Searching | Superseded) → Idle`. Batches are never interrupted; a newer
//! head is only noticed between batches, at most once per poll interval.

use crate::client::HeadSource;
use crate::config::Config;
use crate::core::{BlockTemplate, MiningResult, Nonce, SearchCoordinator};
use crate::types::Submission;
use crate::utils::{format_hash_rate, hash_rate};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument, Span};

/// Knobs a session runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Contents of every block we build
    pub identity: String,
    pub lane_count: u32,
    pub iteration_budget: u64,
    /// Minimum time between head polls
    pub poll_interval: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            identity: config.identity.clone(),
            lane_count: config.lane_count,
            iteration_budget: config.iteration_budget,
            poll_interval: config.poll_interval_duration(),
        }
    }

    /// Hashes attempted by one full batch
    pub fn batch_size(&self) -> u64 {
        u64::from(self.lane_count).saturating_mul(self.iteration_budget)
    }
}

/// A nonce that satisfies a template's difficulty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub template: BlockTemplate,
    pub nonce: Nonce,
    pub digest: [u8; 32],
}

impl Solution {
    /// The request body announcing this block
    pub fn submission(&self) -> Submission {
        Submission::new(&self.template, self.nonce)
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

/// Counters kept across batches
#[derive(Debug, Clone, Default)]
pub struct MiningStats {
    /// Total hashes computed
    pub total_hashes: u64,
    /// Batches run
    pub batches: u64,
    /// Number of solutions found
    pub solutions_found: u64,
    /// Templates dropped for a newer head
    pub templates_superseded: u64,
    /// Hash rate over the last poll interval (hashes per second)
    pub current_hash_rate: f64,
}

impl MiningStats {
    /// Update hash rate calculations
    pub fn update_hash_rate(&mut self, new_hashes: u64, elapsed: Duration) {
        self.current_hash_rate = hash_rate(new_hashes, elapsed);
    }

    fn record_batch(&mut self, result: &MiningResult) {
        self.total_hashes = self.total_hashes.saturating_add(result.hashes);
        self.batches += 1;
        if result.found {
            self.solutions_found += 1;
        }
    }
}

/// Where a session is in its cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Holding a template, no batch started yet
    Idle,
    /// Next step runs a batch
    Searching,
    /// A batch found a solution; the session is done
    Found(Solution),
    /// The last batch found nothing
    Exhausted,
    /// Next step asks the head source for news
    Polling,
    /// A newer head replaces the current template on the next step
    Superseded(BlockTemplate),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Searching => write!(f, "searching"),
            SessionState::Found(_) => write!(f, "found"),
            SessionState::Exhausted => write!(f, "exhausted"),
            SessionState::Polling => write!(f, "polling"),
            SessionState::Superseded(_) => write!(f, "superseded"),
        }
    }
}

/// Drives the search for one template at a time
pub struct MiningSession {
    template: BlockTemplate,
    state: SessionState,
    settings: SessionSettings,
    coordinator: Arc<SearchCoordinator>,
    source: Arc<dyn HeadSource>,
    last_poll: Instant,
    hashes_since_poll: u64,
    stats: MiningStats,
}

impl MiningSession {
    pub fn new(
        template: BlockTemplate,
        settings: SessionSettings,
        coordinator: Arc<SearchCoordinator>,
        source: Arc<dyn HeadSource>,
    ) -> Self {
        Self {
            template,
            state: SessionState::Idle,
            settings,
            coordinator,
            source,
            last_poll: Instant::now(),
            hashes_since_poll: 0,
            stats: MiningStats::default(),
        }
    }

    pub fn template(&self) -> &BlockTemplate {
        &self.template
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stats(&self) -> &MiningStats {
        &self.stats
    }

    /// Start over on `template`, keeping statistics
    pub fn restart(&mut self, template: BlockTemplate) {
        self.template = template;
        self.state = SessionState::Idle;
    }

    /// Perform one transition and return the new state.
    ///
    /// `Found` is terminal: stepping it again changes nothing.
    pub async fn step(&mut self) -> Result<&SessionState> {
        let next = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => {
                self.announce_template();
                SessionState::Searching
            }
            SessionState::Searching => self.search().await,
            SessionState::Exhausted => {
                if self.last_poll.elapsed() >= self.settings.poll_interval {
                    SessionState::Polling
                } else {
                    SessionState::Searching
                }
            }
            SessionState::Polling => self.poll().await,
            SessionState::Superseded(template) => {
                self.stats.templates_superseded += 1;
                self.template = template;
                SessionState::Idle
            }
            found @ SessionState::Found(_) => found,
        };

        self.state = next;
        Ok(&self.state)
    }

    /// Step until a solution is found.
    ///
    /// Returns `None` when `cancel` fires; cancellation is checked between
    /// steps, so an in-flight batch always completes first.
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<Option<Solution>> {
        let span = info_span!(
            "session",
            length = self.template.length(),
            difficulty = self.template.difficulty().bits()
        );

        self.run_steps(cancel).instrument(span).await
    }

    async fn run_steps(&mut self, cancel: &CancellationToken) -> Result<Option<Solution>> {
        loop {
            if cancel.is_cancelled() {
                debug!("Session cancelled in state {}", self.state);
                return Ok(None);
            }

            self.step().await?;
            match &self.state {
                SessionState::Found(solution) => return Ok(Some(solution.clone())),
                SessionState::Idle => {
                    Span::current().record("length", self.template.length());
                    Span::current().record("difficulty", self.template.difficulty().bits());
                }
                _ => {}
            }
        }
    }

    fn announce_template(&self) {
        let difficulty = self.template.difficulty();
        info!(
            "Mining length {} after {} at difficulty {}",
            self.template.length(),
            self.template.prev_hash_hex(),
            difficulty
        );
        if !difficulty.is_supported() {
            warn!(
                "Difficulty {} is beyond what the evaluator fully checks; solutions may be rejected",
                difficulty
            );
        }
    }

    async fn search(&mut self) -> SessionState {
        let start: u64 = rand::random();
        let coordinator = Arc::clone(&self.coordinator);
        let template = self.template.clone();
        let lane_count = self.settings.lane_count;
        let iteration_budget = self.settings.iteration_budget;

        debug!(
            "Starting batch at {} with {} lanes of {}",
            start, lane_count, iteration_budget
        );

        let joined = tokio::task::spawn_blocking(move || {
            coordinator.run_batch(&template, start, lane_count, iteration_budget)
        })
        .await;
        self.finish_batch(joined)
    }

    /// Fold a finished batch into the statistics. A batch whose task died
    /// counts as exhausted so the session keeps going.
    fn finish_batch(&mut self, joined: std::result::Result<MiningResult, JoinError>) -> SessionState {
        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                let error = Error::search(e.to_string());
                warn!(category = error.category(), "Batch abandoned: {}", error);
                return SessionState::Exhausted;
            }
        };

        self.stats.record_batch(&result);
        self.hashes_since_poll = self.hashes_since_poll.saturating_add(result.hashes);

        match result.solution() {
            Some((nonce, digest)) => {
                let solution = Solution {
                    template: self.template.clone(),
                    nonce,
                    digest,
                };
                info!(
                    "Found nonce {} for length {}: {}",
                    nonce,
                    self.template.length(),
                    solution.digest_hex()
                );
                SessionState::Found(solution)
            }
            None => SessionState::Exhausted,
        }
    }

    async fn poll(&mut self) -> SessionState {
        self.stats
            .update_hash_rate(self.hashes_since_poll, self.last_poll.elapsed());
        info!(
            "Hash rate: {} ({} hashes total)",
            format_hash_rate(self.stats.current_hash_rate),
            self.stats.total_hashes
        );
        self.hashes_since_poll = 0;
        self.last_poll = Instant::now();

        let head = match self.source.poll(&self.template).await {
            Ok(Some(head)) => head,
            Ok(None) => {
                debug!("No newer block");
                return SessionState::Searching;
            }
            Err(e) => {
                warn!(category = e.category(), "Head poll failed: {}", e);
                return SessionState::Searching;
            }
        };

        match head.next_template(&self.settings.identity) {
            Ok(next) if next.length() != self.template.length() => {
                info!("Head hash {} at length {}", next.prev_hash_hex(), head.length);
                SessionState::Superseded(next)
            }
            Ok(_) => SessionState::Searching,
            Err(e) => {
                warn!(category = e.category(), "Ignoring head: {}", e);
                SessionState::Searching
            }
        }
    }
}

impl fmt::Debug for MiningSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiningSession")
            .field("template", &self.template)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}
