//! Configuration management for the miner
//!
//! Supports configuration via command line arguments, environment variables,
//! and a configuration file (YAML or JSON). Values given on the command line
//! or through the environment win over the file; the file wins over defaults.

use crate::core::constants::MAX_CONTENTS_LEN;
use crate::types::TargetMode;
use crate::{Error, Result};
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    Plain,
    /// One JSON object per event
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Plain => write!(f, "plain"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Complete configuration for the miner
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(
    name = "chainhead-miner",
    version = env!("CARGO_PKG_VERSION"),
    about = "Proof-of-work miner that follows a chain head over HTTP"
)]
pub struct Config {
    /// Print the parsed configuration and exit
    #[arg(long)]
    #[serde(skip)]
    pub print_config: bool,

    /// Configuration file path (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Miner identity, stored as the block contents
    #[arg(short = 'i', long, env = "CHAINHEAD_IDENTITY", default_value = "32")]
    #[serde(default = "default_identity")]
    pub identity: String,

    /// Number of search lanes per batch
    #[arg(short = 'c', long, default_value_t = default_lane_count())]
    #[serde(default = "default_lane_count")]
    pub lane_count: u32,

    /// Threads in the lane pool (0 = lane count, capped at the CPU count)
    #[arg(long, default_value = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Candidates each lane tries per batch
    #[arg(short = 'b', long, default_value = "1000000")]
    #[serde(default = "default_iteration_budget")]
    pub iteration_budget: u64,

    /// Chain node address
    #[arg(short = 'n', long, env = "CHAINHEAD_NODE", default_value = "6857coin.csail.mit.edu")]
    #[serde(default = "default_node")]
    pub node: String,

    /// Use TLS to connect to node
    #[arg(short = 't', long)]
    #[serde(default)]
    pub tls: bool,

    /// Mine after this block hash instead of the node's head (hex)
    #[arg(long, value_name = "HASH", requires = "next_length")]
    pub next_hash: Option<String>,

    /// Length of the block given by --next-hash
    #[arg(long, value_name = "LENGTH", requires = "next_hash")]
    pub next_length: Option<u32>,

    /// Seconds between head polls
    #[arg(short = 'p', long, default_value = "30")]
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// HTTP timeout in milliseconds
    #[arg(long, default_value = "30000")]
    #[serde(default = "default_http_timeout")]
    pub http_timeout: u64,

    /// Log filter directive (e.g. info, debug, chainhead_miner=trace)
    #[arg(short = 'l', long, default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[arg(long, default_value = "plain")]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Config {
    /// Parse the process arguments and merge the configuration file, if any
    pub async fn load() -> Result<Self> {
        let matches = Self::command().get_matches();
        Self::from_matches(&matches).await
    }

    /// Like [`Config::load`] with explicit arguments; the first one is the program name
    pub async fn load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command()
            .try_get_matches_from(args)
            .map_err(|e| Error::config(e.to_string()))?;
        Self::from_matches(&matches).await
    }

    async fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut config =
            Self::from_arg_matches(matches).map_err(|e| Error::config(e.to_string()))?;

        if let Some(config_file) = &config.config_file {
            let file_config = Self::load_from_file(config_file).await?;
            config = config.merge_with_file(file_config, matches);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(Error::from)
        } else {
            // Default to YAML
            serde_yaml::from_str(&content).map_err(Error::from)
        }
    }

    /// Take file values for everything not set explicitly on the command line
    fn merge_with_file(mut self, file: Self, matches: &ArgMatches) -> Self {
        let explicit = |id: &str| {
            matches!(
                matches.value_source(id),
                Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable)
            )
        };

        if !explicit("identity") {
            self.identity = file.identity;
        }
        if !explicit("lane_count") {
            self.lane_count = file.lane_count;
        }
        if !explicit("threads") {
            self.threads = file.threads;
        }
        if !explicit("iteration_budget") {
            self.iteration_budget = file.iteration_budget;
        }
        if !explicit("node") {
            self.node = file.node;
        }
        if !explicit("tls") {
            self.tls = file.tls;
        }
        if self.next_hash.is_none() && self.next_length.is_none() {
            self.next_hash = file.next_hash;
            self.next_length = file.next_length;
        }
        if !explicit("poll_interval") {
            self.poll_interval = file.poll_interval;
        }
        if !explicit("http_timeout") {
            self.http_timeout = file.http_timeout;
        }
        if !explicit("log_level") {
            self.log_level = file.log_level;
        }
        if !explicit("log_format") {
            self.log_format = file.log_format;
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.identity.len() > MAX_CONTENTS_LEN {
            return Err(Error::config(format!(
                "Identity must be at most {} bytes, got {}",
                MAX_CONTENTS_LEN,
                self.identity.len()
            )));
        }

        if self.lane_count == 0 {
            return Err(Error::config("Lane count must be greater than 0"));
        }

        if self.iteration_budget == 0 {
            return Err(Error::config("Iteration budget must be greater than 0"));
        }

        Url::parse(&self.node_url())
            .map_err(|e| Error::config(format!("Invalid node URL: {}", e)))?;

        self.target_mode()?;

        Ok(())
    }

    /// Template source selected by `--next-hash`/`--next-length`
    pub fn target_mode(&self) -> Result<TargetMode> {
        match (&self.next_hash, self.next_length) {
            (None, None) => Ok(TargetMode::Head),
            (Some(hash), Some(length)) => {
                let bytes = hex::decode(hash)
                    .map_err(|e| Error::config(format!("Invalid next hash: {}", e)))?;
                let hash: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
                    Error::config(format!("Next hash must be 32 bytes, got {}", bytes.len()))
                })?;
                Ok(TargetMode::NextAfter { hash, length })
            }
            _ => Err(Error::config(
                "next_hash and next_length must be given together",
            )),
        }
    }

    /// Get node URL
    pub fn node_url(&self) -> String {
        if self.tls {
            format!("https://{}", self.node)
        } else {
            format!("http://{}", self.node)
        }
    }

    /// Size of the lane pool
    pub fn pool_threads(&self) -> usize {
        if self.threads == 0 {
            (self.lane_count as usize).min(num_cpus::get()).max(1)
        } else {
            self.threads
        }
    }

    /// Get poll interval duration
    pub fn poll_interval_duration(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// Get HTTP timeout duration
    pub fn http_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.http_timeout)
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::from)
    }
}

// Default value functions for serde
fn default_identity() -> String { "32".to_string() }
fn default_lane_count() -> u32 { num_cpus::get() as u32 }
fn default_iteration_budget() -> u64 { 1_000_000 }
fn default_node() -> String { "6857coin.csail.mit.edu".to_string() }
fn default_poll_interval() -> u64 { 30 }
fn default_http_timeout() -> u64 { 30000 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> LogFormat { LogFormat::Plain }
