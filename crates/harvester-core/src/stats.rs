//! Run statistics for batch and stream harvesting.
//!
//! Pure bookkeeping, decoupled from I/O so the harvesters and the CLI can share it.

/// What happened to one unit delivered by the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Tweet written to the sink
    Accepted,
    /// Protocol message or malformed unit without body text
    NotAPost,
    /// Tweet in a language other than the accepted one
    WrongLanguage,
}

/// Statistics for a stream run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamStats {
    pub accepted: u64,
    pub not_a_post: u64,
    pub wrong_language: u64,
}

impl StreamStats {
    /// Creates a new empty stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome, incrementing the appropriate counter.
    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Accepted => self.accepted += 1,
            UnitOutcome::NotAPost => self.not_a_post += 1,
            UnitOutcome::WrongLanguage => self.wrong_language += 1,
        }
    }

    /// Returns the number of units delivered by the stream.
    pub fn seen(&self) -> u64 {
        self.accepted + self.not_a_post + self.wrong_language
    }

    /// Returns the number of units that were discarded.
    pub fn skipped(&self) -> u64 {
        self.not_a_post + self.wrong_language
    }
}

// =============================================================================
// Batch Harvest Types
// =============================================================================

/// Result of fetching one account's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountHarvestResult {
    /// Handle the timeline was fetched for.
    pub account: String,
    /// Requested count, 0 for the API default.
    pub requested: u64,
    /// Tweets actually returned and written.
    pub fetched: usize,
}

impl AccountHarvestResult {
    pub fn new(account: String, requested: u64, fetched: usize) -> Self {
        Self {
            account,
            requested,
            fetched,
        }
    }

    /// Returns true if the account returned fewer tweets than a positive request.
    pub fn is_short(&self) -> bool {
        self.requested > 0 && (self.fetched as u64) < self.requested
    }
}

/// Aggregated results from a batch run over several accounts.
#[derive(Debug, Clone, Default)]
pub struct BatchHarvestSummary {
    /// Results for each account, in fetch order.
    pub results: Vec<AccountHarvestResult>,
}

impl BatchHarvestSummary {
    /// Creates a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: AccountHarvestResult) {
        self.results.push(result);
    }

    /// Returns the total number of tweets written across all accounts.
    pub fn total_records(&self) -> usize {
        self.results.iter().map(|r| r.fetched).sum()
    }

    /// Returns the number of timeline fetches performed.
    pub fn total_accounts(&self) -> usize {
        self.results.len()
    }

    /// Returns the number of accounts that had fewer tweets than requested.
    pub fn short_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_short()).count()
    }
}
