//! Transport boundary.
//!
//! The harvesters never talk HTTP themselves. They pull from a [`RecordSource`],
//! which returns whole timelines for batch mode and a lazy sequence of raw
//! units for stream mode.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::HarvestError;
use crate::models::Record;
use crate::request::StreamFilter;

/// Lazy, non-restartable sequence of units delivered by a live stream.
///
/// Units are raw JSON values because the stream also carries protocol messages
/// that are not tweets.
pub type UnitStream = BoxStream<'static, Result<Value, HarvestError>>;

/// Source of tweets for both acquisition modes.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetches up to `count` of the most recent tweets of `screen_name`.
    ///
    /// A `count` of 0 leaves the page size to the API. Fewer tweets than
    /// requested is not an error.
    async fn fetch_user_timeline(
        &self,
        screen_name: &str,
        count: u64,
    ) -> Result<Vec<Record>, HarvestError>;

    /// Opens the unfiltered sample stream.
    async fn open_sample(&self) -> Result<UnitStream, HarvestError>;

    /// Opens a stream restricted to the comma-separated `track` terms.
    async fn open_filter(&self, track: &str) -> Result<UnitStream, HarvestError>;

    /// Opens whichever stream `filter` names.
    async fn open_stream(&self, filter: &StreamFilter) -> Result<UnitStream, HarvestError> {
        match filter {
            StreamFilter::Sample => self.open_sample().await,
            StreamFilter::Track(track) => self.open_filter(track).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory sources for harvester tests.

    use super::*;
    use futures::stream;
    use futures::StreamExt;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    pub fn tweet(text: &str, lang: &str) -> Value {
        json!({
            "created_at": "Mon Oct 19 10:00:00 +0000 2026",
            "text": text,
            "lang": lang,
            "user": {"name": "Alice", "screen_name": "alice"}
        })
    }

    /// Serves fixed timelines and a fixed stream.
    #[derive(Default)]
    pub struct FakeSource {
        pub timelines: HashMap<String, Vec<Record>>,
        pub failing_accounts: Vec<String>,
        pub units: Mutex<Option<Vec<Value>>>,
        pub connect_error: bool,
        pub stall_connect: bool,
        pub pending_after_units: bool,
        pub requests: Mutex<Vec<(String, u64)>>,
        pub opened: Mutex<Vec<StreamFilter>>,
    }

    impl FakeSource {
        pub fn with_units(units: Vec<Value>) -> Self {
            Self {
                units: Mutex::new(Some(units)),
                ..Default::default()
            }
        }

        pub fn with_timeline(mut self, account: &str, size: usize) -> Self {
            let records = (0..size)
                .map(|i| Record::from_unit(tweet(&format!("{} #{}", account, i), "en")).unwrap())
                .collect();
            self.timelines.insert(account.to_string(), records);
            self
        }

        fn take_stream(&self) -> Result<UnitStream, HarvestError> {
            if self.connect_error {
                return Err(HarvestError::Client("HTTP 503".to_string()));
            }
            let units = self.units.lock().unwrap().take().unwrap_or_default();
            let delivered = stream::iter(units.into_iter().map(Ok));
            if self.pending_after_units {
                Ok(Box::pin(delivered.chain(stream::pending())))
            } else {
                Ok(Box::pin(delivered))
            }
        }
    }

    #[async_trait]
    impl RecordSource for FakeSource {
        async fn fetch_user_timeline(
            &self,
            screen_name: &str,
            count: u64,
        ) -> Result<Vec<Record>, HarvestError> {
            self.requests
                .lock()
                .unwrap()
                .push((screen_name.to_string(), count));

            if self.failing_accounts.iter().any(|a| a == screen_name) {
                return Err(HarvestError::Client("HTTP 500".to_string()));
            }

            let mut records = self.timelines.get(screen_name).cloned().unwrap_or_default();
            if count > 0 {
                records.truncate(count as usize);
            }
            Ok(records)
        }

        async fn open_sample(&self) -> Result<UnitStream, HarvestError> {
            self.opened.lock().unwrap().push(StreamFilter::Sample);
            if self.stall_connect {
                std::future::pending::<()>().await;
            }
            self.take_stream()
        }

        async fn open_filter(&self, track: &str) -> Result<UnitStream, HarvestError> {
            self.opened
                .lock()
                .unwrap()
                .push(StreamFilter::Track(track.to_string()));
            self.take_stream()
        }
    }
}
