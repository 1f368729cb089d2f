//! Chain node client
//!
//! The session only sees the [`HeadSource`] and [`SubmissionSink`] traits;
//! [`ChainClient`] implements both over the node's HTTP API.

use crate::core::BlockTemplate;
use crate::types::{HeadRecord, Submission, TargetMode};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Body marker the node sends when the requested block has no successor yet
pub const NO_NEXT_BLOCK: &str = "no next block";

/// Something that can report the chain head
#[async_trait]
pub trait HeadSource: Send + Sync {
    /// Fetch the block to build on, given the template currently mined.
    ///
    /// `Ok(None)` means there is nothing newer to report.
    async fn poll(&self, current: &BlockTemplate) -> Result<Option<HeadRecord>>;

    /// The node's current head, used for the first template in head mode
    async fn current_head(&self) -> Result<HeadRecord>;
}

/// Something that accepts solved blocks
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, submission: &Submission) -> Result<()>;
}

/// HTTP client for the chain node
#[derive(Debug, Clone)]
pub struct ChainClient {
    client: Client,
    base_url: Url,
    mode: TargetMode,
}

impl ChainClient {
    /// Create a client for `base_url` (e.g. `http://host:port`)
    pub fn new(base_url: impl AsRef<str>, timeout: Duration, mode: TargetMode) -> Result<Self> {
        let mut base = base_url.as_ref().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).map_err(|e| Error::config(format!("Invalid base URL: {}", e)))?;

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            client,
            base_url,
            mode,
        })
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::config(format!("Failed to build {} URL: {}", path, e)))
    }

    /// `GET /head`
    #[instrument(skip(self))]
    pub async fn head(&self) -> Result<HeadRecord> {
        let url = self.endpoint("head")?;
        self.fetch_block(url)
            .await?
            .ok_or_else(|| Error::malformed_response("/head reported no block"))
    }

    /// `GET /next/{hash}`; `None` while the block has no successor
    #[instrument(skip(self))]
    pub async fn next_after(&self, prev_hash_hex: &str) -> Result<Option<HeadRecord>> {
        let url = self.endpoint(&format!("next/{}", prev_hash_hex))?;
        self.fetch_block(url).await
    }

    async fn fetch_block(&self, url: Url) -> Result<Option<HeadRecord>> {
        debug!("Fetching block from: {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed = if status.is_success() {
            serde_json::from_str::<HeadRecord>(&body).map_err(|e| format!("Failed to parse block: {}", e))
        } else {
            Err(format!("HTTP {}: {}", status, body.trim()))
        };

        match parsed {
            Ok(record) => Ok(Some(record)),
            // Only bodies that are not a block can mean "no successor yet"
            Err(_) if body.contains(NO_NEXT_BLOCK) => {
                debug!("Node has no next block yet");
                Ok(None)
            }
            Err(message) => Err(Error::malformed_response(message)),
        }
    }

    /// `POST /add`
    #[instrument(skip(self, submission), fields(nonce = submission.nonce, length = submission.length))]
    pub async fn add(&self, submission: &Submission) -> Result<()> {
        let url = self.endpoint("add")?;
        debug!("Submitting block to: {}", url);

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(submission)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Node accepted {}", submission);
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!("Node rejected block: HTTP {}", status);
            Err(Error::submission(format!("HTTP {}: {}", status, body.trim())))
        }
    }
}

#[async_trait]
impl HeadSource for ChainClient {
    async fn poll(&self, current: &BlockTemplate) -> Result<Option<HeadRecord>> {
        match self.mode {
            TargetMode::Head => self.head().await.map(Some),
            TargetMode::NextAfter { .. } => self.next_after(&current.prev_hash_hex()).await,
        }
    }

    async fn current_head(&self) -> Result<HeadRecord> {
        self.head().await
    }
}

#[async_trait]
impl SubmissionSink for ChainClient {
    async fn submit(&self, submission: &Submission) -> Result<()> {
        self.add(submission).await
    }
}
