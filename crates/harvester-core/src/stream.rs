//! Stream mode: continuous ingestion from a live feed.
//!
//! A run moves through `Connecting → Streaming → StoppedByCount | StoppedBySignal
//! → Closed`. A transport that ends its sequence stops the run as `Exhausted`,
//! which closes the sink the same way. Cancellation is observed while the
//! stream is being opened and between units.

use chrono::Utc;
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::HarvestError;
use crate::format::OutputFormat;
use crate::models::Record;
use crate::request::StreamFilter;
use crate::shutdown::ShutdownToken;
use crate::sink::OutputSink;
use crate::source::{RecordSource, UnitStream};
use crate::stats::{StreamStats, UnitOutcome};

/// Accepted records between two progress reports.
pub const PROGRESS_INTERVAL: u64 = 100;

/// True when `accepted` records warrant a progress report.
fn is_progress_point(accepted: u64) -> bool {
    accepted > 0 && accepted % PROGRESS_INTERVAL == 0
}

/// Lifecycle phase of a stream run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestPhase {
    Connecting,
    Streaming,
    StoppedByCount,
    StoppedBySignal,
    Exhausted,
    Closed,
}

/// Why the streaming loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The target count was reached
    Count,
    /// The shutdown token was cancelled
    Signal,
    /// The transport ended the sequence
    Exhausted,
}

impl StopReason {
    fn phase(self) -> HarvestPhase {
        match self {
            StopReason::Count => HarvestPhase::StoppedByCount,
            StopReason::Signal => HarvestPhase::StoppedBySignal,
            StopReason::Exhausted => HarvestPhase::Exhausted,
        }
    }
}

/// Mutable state of a stream run, touched only by the harvesting loop.
#[derive(Debug, Clone)]
pub struct HarvestState {
    phase: HarvestPhase,
    stats: StreamStats,
}

impl HarvestState {
    fn new() -> Self {
        Self {
            phase: HarvestPhase::Connecting,
            stats: StreamStats::new(),
        }
    }

    fn enter(&mut self, phase: HarvestPhase) {
        debug!(from = ?self.phase, to = ?phase, "Stream phase change");
        self.phase = phase;
    }

    pub fn phase(&self) -> HarvestPhase {
        self.phase
    }

    pub fn accepted(&self) -> u64 {
        self.stats.accepted
    }
}

/// Result of a completed stream run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub stop: StopReason,
    pub phase: HarvestPhase,
    pub stats: StreamStats,
}

/// Consumes a live stream, filters it, and writes accepted tweets to a sink.
pub struct StreamHarvester<'a, S: RecordSource + ?Sized> {
    source: &'a S,
    format: OutputFormat,
}

impl<'a, S: RecordSource + ?Sized> StreamHarvester<'a, S> {
    pub fn new(source: &'a S, format: OutputFormat) -> Self {
        Self { source, format }
    }

    /// Runs the stream until `limit` tweets are accepted, the token is
    /// cancelled, or the transport ends the sequence. A `limit` of 0 only ends
    /// on cancellation.
    ///
    /// The sink is closed on every exit path, including errors.
    ///
    /// # Errors
    ///
    /// - `HarvestError::StreamConnectError` if the stream cannot be opened
    /// - any transport or sink error raised while streaming
    #[instrument(skip(self, sink, token))]
    pub async fn run(
        &self,
        filter: &StreamFilter,
        limit: u64,
        mut sink: OutputSink,
        mut token: ShutdownToken,
    ) -> Result<StreamOutcome, HarvestError> {
        let mut state = HarvestState::new();

        let connected = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            units = self.connect(filter) => Some(units),
        };

        let result = match connected {
            None => Ok(StopReason::Signal),
            Some(Ok(mut units)) => {
                state.enter(HarvestPhase::Streaming);
                if limit > 0 {
                    info!("Fetching {} tweets...", limit);
                } else {
                    info!("Fetching tweets. Press Ctrl+C to stop.");
                }
                self.consume(&mut units, limit, &mut sink, &mut state, &mut token)
                    .await
            }
            Some(Err(e)) => Err(e),
        };

        if let Ok(stop) = &result {
            state.enter(stop.phase());
        }

        let closed = sink.close();
        state.enter(HarvestPhase::Closed);

        let stop = result?;
        closed?;

        match stop {
            StopReason::Count => info!(accepted = state.accepted(), "Reached target count"),
            StopReason::Signal => info!(accepted = state.accepted(), "Harvest interrupted"),
            StopReason::Exhausted => info!(accepted = state.accepted(), "Stream ended"),
        }

        Ok(StreamOutcome {
            stop,
            phase: state.phase,
            stats: state.stats,
        })
    }

    async fn connect(&self, filter: &StreamFilter) -> Result<UnitStream, HarvestError> {
        self.source.open_stream(filter).await.map_err(|e| match e {
            HarvestError::StreamConnectError(_) => e,
            other => HarvestError::StreamConnectError(other.to_string()),
        })
    }

    async fn consume(
        &self,
        units: &mut UnitStream,
        limit: u64,
        sink: &mut OutputSink,
        state: &mut HarvestState,
        token: &mut ShutdownToken,
    ) -> Result<StopReason, HarvestError> {
        loop {
            // Writes happen synchronously below, so cancellation can only be
            // observed between units.
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(StopReason::Signal),
                next = units.next() => next,
            };

            let unit = match next {
                Some(unit) => unit?,
                None => return Ok(StopReason::Exhausted),
            };

            let outcome = self.process(unit, sink)?;
            state.stats.record(outcome);

            if outcome != UnitOutcome::Accepted {
                continue;
            }

            let accepted = state.stats.accepted;
            if is_progress_point(accepted) {
                info!(
                    at = %Utc::now().to_rfc3339(),
                    total = accepted,
                    "Fetched {} tweets.",
                    accepted
                );
            }

            if limit > 0 && accepted >= limit {
                return Ok(StopReason::Count);
            }
        }
    }

    fn process(&self, unit: Value, sink: &mut OutputSink) -> Result<UnitOutcome, HarvestError> {
        let Some(record) = Record::from_unit(unit) else {
            return Ok(UnitOutcome::NotAPost);
        };
        if !record.is_accepted_language() {
            return Ok(UnitOutcome::WrongLanguage);
        }

        sink.write_record(&self.format.render(record)?)?;
        Ok(UnitOutcome::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::shutdown_channel;
    use crate::sink::testing::SharedBuffer;
    use crate::source::testing::{tweet, FakeSource};
    use serde_json::json;
    use std::time::Duration;

    fn english(n: usize) -> Vec<Value> {
        (0..n).map(|i| tweet(&format!("t{}", i), "en")).collect()
    }

    #[tokio::test]
    async fn test_stops_at_target_count_in_order() {
        let source = FakeSource::with_units(english(5));
        let buffer = SharedBuffer::default();

        let outcome = StreamHarvester::new(&source, OutputFormat::TextOnly)
            .run(
                &StreamFilter::Sample,
                3,
                OutputSink::from_writer(buffer.clone()),
                ShutdownToken::never(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.stop, StopReason::Count);
        assert_eq!(outcome.phase, HarvestPhase::Closed);
        assert_eq!(outcome.stats.accepted, 3);
        assert_eq!(buffer.contents(), "t0\nt1\nt2\n");
    }

    #[tokio::test]
    async fn test_filters_non_posts_and_other_languages() {
        let units = vec![
            json!({"delete": {"status": {"id": 1}}}),
            tweet("hola", "es"),
            tweet("one", "en"),
            json!({"limit": {"track": 12}}),
            tweet("bonjour", "fr"),
            tweet("two", "en"),
            tweet("three", "en"),
        ];
        let source = FakeSource::with_units(units);
        let buffer = SharedBuffer::default();

        let outcome = StreamHarvester::new(&source, OutputFormat::TextOnly)
            .run(
                &StreamFilter::Track("rust".to_string()),
                2,
                OutputSink::from_writer(buffer.clone()),
                ShutdownToken::never(),
            )
            .await
            .unwrap();

        assert_eq!(buffer.contents(), "one\ntwo\n");
        assert_eq!(outcome.stats.accepted, 2);
        assert_eq!(outcome.stats.not_a_post, 2);
        assert_eq!(outcome.stats.wrong_language, 2);
        assert_eq!(
            *source.opened.lock().unwrap(),
            vec![StreamFilter::Track("rust".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unit_without_text_never_counts() {
        let source = FakeSource::with_units(vec![
            json!({"user": {"name": "A", "screen_name": "a"}, "created_at": "x", "lang": "en"}),
            json!({"text": 5, "lang": "en"}),
        ]);
        let buffer = SharedBuffer::default();

        let outcome = StreamHarvester::new(&source, OutputFormat::Json)
            .run(
                &StreamFilter::Sample,
                1,
                OutputSink::from_writer(buffer.clone()),
                ShutdownToken::never(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.stop, StopReason::Exhausted);
        assert_eq!(outcome.stats.accepted, 0);
        assert!(buffer.contents().is_empty());
    }

    #[tokio::test]
    async fn test_signal_stops_blocked_stream() {
        let mut source = FakeSource::with_units(english(2));
        source.pending_after_units = true;
        let buffer = SharedBuffer::default();
        let (trigger, token) = shutdown_channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            StreamHarvester::new(&source, OutputFormat::TextOnly).run(
                &StreamFilter::Sample,
                0,
                OutputSink::from_writer(buffer.clone()),
                token,
            ),
        )
        .await
        .expect("run should stop on signal")
        .unwrap();

        assert_eq!(outcome.stop, StopReason::Signal);
        assert_eq!(outcome.phase, HarvestPhase::Closed);
        assert_eq!(outcome.stats.accepted, 2);
        assert_eq!(buffer.contents(), "t0\nt1\n");
    }

    #[tokio::test]
    async fn test_already_cancelled_token_writes_nothing() {
        let source = FakeSource::with_units(english(3));
        let buffer = SharedBuffer::default();
        let (trigger, token) = shutdown_channel();
        trigger.trigger();

        let outcome = StreamHarvester::new(&source, OutputFormat::TextOnly)
            .run(
                &StreamFilter::Sample,
                0,
                OutputSink::from_writer(buffer.clone()),
                token,
            )
            .await
            .unwrap();

        assert_eq!(outcome.stop, StopReason::Signal);
        assert!(buffer.contents().is_empty());
    }

    #[tokio::test]
    async fn test_signal_stops_stalled_connect() {
        let mut source = FakeSource::with_units(english(3));
        source.stall_connect = true;
        let buffer = SharedBuffer::default();
        let (trigger, token) = shutdown_channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            StreamHarvester::new(&source, OutputFormat::TextOnly).run(
                &StreamFilter::Sample,
                0,
                OutputSink::from_writer(buffer.clone()),
                token,
            ),
        )
        .await
        .expect("run should stop on signal while connecting")
        .unwrap();

        assert_eq!(outcome.stop, StopReason::Signal);
        assert_eq!(outcome.phase, HarvestPhase::Closed);
        assert_eq!(outcome.stats.accepted, 0);
        assert!(buffer.contents().is_empty());
        assert_eq!(*source.opened.lock().unwrap(), vec![StreamFilter::Sample]);
    }

    #[test]
    fn test_progress_points() {
        assert!(!is_progress_point(0));
        assert!(!is_progress_point(99));
        assert!(is_progress_point(100));
        assert!(!is_progress_point(101));
        assert!(is_progress_point(200));
    }

    #[tokio::test]
    async fn test_connect_failure_is_stream_connect_error() {
        let mut source = FakeSource::default();
        source.connect_error = true;

        let result = StreamHarvester::new(&source, OutputFormat::TextOnly)
            .run(
                &StreamFilter::Sample,
                0,
                OutputSink::from_writer(SharedBuffer::default()),
                ShutdownToken::never(),
            )
            .await;

        match result {
            Err(HarvestError::StreamConnectError(msg)) => assert!(msg.contains("503")),
            other => panic!("Expected StreamConnectError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unbounded_run_counts_past_progress_interval() {
        let source = FakeSource::with_units(english(250));
        let buffer = SharedBuffer::default();

        let outcome = StreamHarvester::new(&source, OutputFormat::TextOnly)
            .run(
                &StreamFilter::Sample,
                0,
                OutputSink::from_writer(buffer.clone()),
                ShutdownToken::never(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.stop, StopReason::Exhausted);
        assert_eq!(outcome.stats.accepted, 250);
        assert_eq!(buffer.contents().lines().count(), 250);
    }
}
