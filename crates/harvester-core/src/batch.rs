//! Batch mode: bounded historical fetch per account.

use tracing::{info, instrument};

use crate::error::HarvestError;
use crate::format::OutputFormat;
use crate::sink::OutputSink;
use crate::source::RecordSource;
use crate::stats::{AccountHarvestResult, BatchHarvestSummary};

/// Fetches account timelines and writes them to a sink.
pub struct BatchHarvester<'a, S: RecordSource + ?Sized> {
    source: &'a S,
    format: OutputFormat,
}

impl<'a, S: RecordSource + ?Sized> BatchHarvester<'a, S> {
    pub fn new(source: &'a S, format: OutputFormat) -> Self {
        Self { source, format }
    }

    /// Fetches up to `limit` tweets for each account, in order, and closes the sink.
    ///
    /// Accounts are not deduplicated. Tweets are written in the order the
    /// transport returns them.
    ///
    /// # Errors
    ///
    /// The first failed fetch aborts the whole run with
    /// `HarvestError::SourceFetchFailed`. Output already written stays in place.
    #[instrument(skip(self, accounts, sink), fields(accounts = accounts.len()))]
    pub async fn run(
        &self,
        accounts: &[String],
        limit: u64,
        mut sink: OutputSink,
    ) -> Result<BatchHarvestSummary, HarvestError> {
        let result = self.fetch_all(accounts, limit, &mut sink).await;
        let closed = sink.close();
        let summary = result?;
        closed?;

        info!(
            accounts = summary.total_accounts(),
            records = summary.total_records(),
            "Batch harvest complete"
        );
        Ok(summary)
    }

    async fn fetch_all(
        &self,
        accounts: &[String],
        limit: u64,
        sink: &mut OutputSink,
    ) -> Result<BatchHarvestSummary, HarvestError> {
        let mut summary = BatchHarvestSummary::new();

        for account in accounts {
            let result = self.fetch_account(account, limit, sink).await?;
            summary.add(result);
        }

        Ok(summary)
    }

    async fn fetch_account(
        &self,
        account: &str,
        limit: u64,
        sink: &mut OutputSink,
    ) -> Result<AccountHarvestResult, HarvestError> {
        if limit == 0 {
            info!("Fetching all tweets from @{}", account);
        } else {
            info!("Fetching {} tweets from @{}", limit, account);
        }

        let records = self
            .source
            .fetch_user_timeline(account, limit)
            .await
            .map_err(|e| match e {
                HarvestError::SourceFetchFailed { .. } => e,
                other => HarvestError::SourceFetchFailed {
                    account: account.to_string(),
                    message: other.to_string(),
                },
            })?;

        let fetched = records.len();
        info!(account, fetched, "  (actually fetched {})", fetched);

        for record in records {
            sink.write_record(&self.format.render(record)?)?;
        }

        Ok(AccountHarvestResult::new(account.to_string(), limit, fetched))
    }
}
