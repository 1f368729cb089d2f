//! The outer mining loop
//!
//! Gets a first template, runs sessions until one finds a solution, submits
//! it, asks for the next head and starts over. Only cancellation ends it.

use crate::client::{HeadSource, SubmissionSink};
use crate::core::{BlockTemplate, SearchCoordinator};
use crate::session::{MiningSession, MiningStats, SessionSettings};
use crate::types::TargetMode;
use crate::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct Miner {
    settings: SessionSettings,
    mode: TargetMode,
    coordinator: Arc<SearchCoordinator>,
    source: Arc<dyn HeadSource>,
    sink: Arc<dyn SubmissionSink>,
}

impl Miner {
    pub fn new(
        settings: SessionSettings,
        mode: TargetMode,
        coordinator: Arc<SearchCoordinator>,
        source: Arc<dyn HeadSource>,
        sink: Arc<dyn SubmissionSink>,
    ) -> Self {
        Self {
            settings,
            mode,
            coordinator,
            source,
            sink,
        }
    }

    /// Mine until `cancel` fires and return the accumulated statistics
    pub async fn run(&self, cancel: CancellationToken) -> Result<MiningStats> {
        info!(
            "Mining as {:?} in {} mode, {} lanes x {} candidates ({} hashes per batch)",
            self.settings.identity,
            self.mode,
            self.settings.lane_count,
            self.settings.iteration_budget,
            self.settings.batch_size()
        );

        let Some(template) = self.initial_template(&cancel).await? else {
            return Ok(MiningStats::default());
        };

        let mut session = MiningSession::new(
            template,
            self.settings.clone(),
            Arc::clone(&self.coordinator),
            Arc::clone(&self.source),
        );

        while let Some(solution) = session.run(&cancel).await? {
            let submission = solution.submission();
            match self.sink.submit(&submission).await {
                Ok(()) => info!("Submitted {}", submission),
                Err(e) => warn!(category = e.category(), "Submission failed: {}", e),
            }

            let next = self.after_solution(&solution.template).await;
            session.restart(next);
        }

        info!("Mining stopped after {} hashes", session.stats().total_hashes);
        Ok(session.stats().clone())
    }

    /// The first template: fixed by next-after mode, otherwise the node's head
    /// fetched again every poll interval until it answers.
    async fn initial_template(&self, cancel: &CancellationToken) -> Result<Option<BlockTemplate>> {
        if let Some(template) = self.mode.initial_template(&self.settings.identity)? {
            return Ok(Some(template));
        }

        loop {
            match self.source.current_head().await {
                Ok(head) => match head.next_template(&self.settings.identity) {
                    Ok(template) => {
                        info!("Head hash {} at length {}", template.prev_hash_hex(), head.length);
                        return Ok(Some(template));
                    }
                    Err(e) => warn!(category = e.category(), "Ignoring head: {}", e),
                },
                Err(e) => warn!(category = e.category(), "Failed to fetch head: {}", e),
            }

            tokio::select! {
                _ = cancel.cancelled() => return Ok(None),
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }

    /// Template to continue with once `solved` has been submitted
    async fn after_solution(&self, solved: &BlockTemplate) -> BlockTemplate {
        let head = match self.source.poll(solved).await {
            Ok(Some(head)) => head,
            Ok(None) => return solved.clone(),
            Err(e) => {
                warn!(category = e.category(), "Head poll failed: {}", e);
                return solved.clone();
            }
        };

        match head.next_template(&self.settings.identity) {
            Ok(template) => {
                info!("Head hash {} at length {}", template.prev_hash_hex(), head.length);
                template
            }
            Err(e) => {
                warn!(category = e.category(), "Ignoring head: {}", e);
                solved.clone()
            }
        }
    }
}

impl std::fmt::Debug for Miner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Miner")
            .field("settings", &self.settings)
            .field("mode", &self.mode)
            .finish()
    }
}
