//! Chain-head proof-of-work miner
//!
//! Searches the 64-bit nonce space for a block whose SHA-256 digest has
//! `length / 100 + 24` leading zero bits:
//! - Single-block SHA-256 core with the nonce spliced into a fixed layout
//! - Parallel lane search on a rayon pool
//! - Session state machine that drops stale templates between batches
//! - HTTP chain client for polling heads and submitting solutions

#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod miner;
pub mod session;
pub mod types;
pub mod utils;

pub use client::{ChainClient, HeadSource, SubmissionSink};
pub use config::Config;
pub use crate::core::{BlockTemplate, Difficulty, MiningResult, Nonce, SearchCoordinator};
pub use error::{Error, Result};
pub use miner::Miner;
pub use session::{MiningSession, MiningStats, SessionSettings, SessionState, Solution};
pub use types::{HeadRecord, Submission, TargetMode};

/// Application information
pub const APP_NAME: &str = "chainhead-miner";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
