//! Dispatch of a resolved request to the matching harvester.

use crate::batch::BatchHarvester;
use crate::error::HarvestError;
use crate::format::OutputFormat;
use crate::request::HarvestRequest;
use crate::shutdown::ShutdownToken;
use crate::sink::OutputSink;
use crate::source::RecordSource;
use crate::stats::BatchHarvestSummary;
use crate::stream::{StreamHarvester, StreamOutcome};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub enum HarvestReport {
    Batch(BatchHarvestSummary),
    Stream(StreamOutcome),
}

impl HarvestReport {
    /// Returns the number of tweets written to the sink.
    pub fn records_written(&self) -> u64 {
        match self {
            HarvestReport::Batch(summary) => summary.total_records() as u64,
            HarvestReport::Stream(outcome) => outcome.stats.accepted,
        }
    }
}

/// Runs `request` against `source`, writing to `sink` in `format`.
///
/// The sink is owned by the run and closed before this returns. The token is
/// only observed in stream mode.
pub async fn run_harvest<S: RecordSource + ?Sized>(
    source: &S,
    request: &HarvestRequest,
    format: OutputFormat,
    sink: OutputSink,
    token: ShutdownToken,
) -> Result<HarvestReport, HarvestError> {
    match request {
        HarvestRequest::Batch { accounts, limit } => BatchHarvester::new(source, format)
            .run(accounts, *limit, sink)
            .await
            .map(HarvestReport::Batch),
        HarvestRequest::Stream { filter, limit } => StreamHarvester::new(source, format)
            .run(filter, *limit, sink, token)
            .await
            .map(HarvestReport::Stream),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::StreamFilter;
    use crate::sink::testing::SharedBuffer;
    use crate::source::testing::{tweet, FakeSource};
    use crate::stream::StopReason;

    #[tokio::test]
    async fn test_batch_request_dispatch() {
        let source = FakeSource::default().with_timeline("alice", 4);
        let buffer = SharedBuffer::default();
        let request = HarvestRequest::Batch {
            accounts: vec!["alice".to_string()],
            limit: 10,
        };

        let report = run_harvest(
            &source,
            &request,
            OutputFormat::Json,
            OutputSink::from_writer(buffer.clone()),
            ShutdownToken::never(),
        )
        .await
        .unwrap();

        assert!(matches!(report, HarvestReport::Batch(_)));
        assert_eq!(report.records_written(), 4);
        assert_eq!(buffer.contents().lines().count(), 4);
    }

    #[tokio::test]
    async fn test_stream_request_dispatch() {
        let source = FakeSource::with_units(vec![
            tweet("a", "en"),
            tweet("b", "en"),
            tweet("c", "en"),
            tweet("d", "en"),
            tweet("e", "en"),
        ]);
        let buffer = SharedBuffer::default();
        let request = HarvestRequest::Stream {
            filter: StreamFilter::Sample,
            limit: 3,
        };

        let report = run_harvest(
            &source,
            &request,
            OutputFormat::TextOnly,
            OutputSink::from_writer(buffer.clone()),
            ShutdownToken::never(),
        )
        .await
        .unwrap();

        match report {
            HarvestReport::Stream(outcome) => assert_eq!(outcome.stop, StopReason::Count),
            other => panic!("Expected stream report, got {:?}", other),
        }
        assert_eq!(buffer.contents(), "a\nb\nc\n");
    }
}
