//! Acquisition mode selection.
//!
//! The CLI hands over its independently optional flags once; this module turns
//! them into a single [`HarvestRequest`] so the rest of the run never branches on
//! which flag happened to be set.

use std::path::{Path, PathBuf};

use crate::error::HarvestError;

/// Effective options as parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Records to harvest; 0 means all available (batch) or unbounded (stream)
    pub count: u64,
    pub user: Option<String>,
    pub users_file: Option<PathBuf>,
    /// Comma-separated track terms
    pub filter: Option<String>,
    pub filters_file: Option<PathBuf>,
}

/// Which live stream to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFilter {
    /// Random cross-section of public tweets
    Sample,
    /// Tweets matching the comma-separated track terms
    Track(String),
}

/// Resolved operation for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestRequest {
    /// Historical fetch of up to `limit` tweets per account.
    Batch { accounts: Vec<String>, limit: u64 },
    /// Live ingestion until `limit` tweets are accepted, or forever when 0.
    Stream { filter: StreamFilter, limit: u64 },
}

impl HarvestRequest {
    /// Selects the acquisition mode from `options`.
    ///
    /// An explicit user or users file selects batch mode. Otherwise a filter or
    /// filters file selects a filtered stream, and with neither the stream is
    /// sampled. Explicit values take precedence over their file counterparts.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::InputFile` if a referenced file cannot be read.
    pub fn select(options: &HarvestOptions) -> Result<Self, HarvestError> {
        if let Some(user) = &options.user {
            return Ok(HarvestRequest::Batch {
                accounts: vec![user.trim_start_matches('@').to_string()],
                limit: options.count,
            });
        }

        if let Some(path) = &options.users_file {
            return Ok(HarvestRequest::Batch {
                accounts: parse_accounts(&read_input(path)?),
                limit: options.count,
            });
        }

        let filter = if let Some(track) = &options.filter {
            StreamFilter::Track(track.clone())
        } else if let Some(path) = &options.filters_file {
            StreamFilter::Track(parse_filters(&read_input(path)?))
        } else {
            StreamFilter::Sample
        };

        Ok(HarvestRequest::Stream {
            filter,
            limit: options.count,
        })
    }

    /// True for a stream run that only ends on interrupt.
    pub fn is_unbounded_stream(&self) -> bool {
        matches!(self, HarvestRequest::Stream { limit: 0, .. })
    }
}

/// Parses an accounts file: handles separated by whitespace, `@` stripped.
pub fn parse_accounts(contents: &str) -> Vec<String> {
    contents
        .trim()
        .replace('@', "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Parses a filters file into a comma-joined track parameter.
pub fn parse_filters(contents: &str) -> String {
    contents.split_whitespace().collect::<Vec<_>>().join(",")
}

fn read_input(path: &Path) -> Result<String, HarvestError> {
    std::fs::read_to_string(path).map_err(|source| HarvestError::InputFile {
        path: path.to_path_buf(),
        source,
    })
}
