use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use harvester_core::error::HarvestError;
use harvester_core::source::{RecordSource, UnitStream};
use harvester_core::Record;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::oauth::{authorization_header, Credentials};

/// Default base URL of the REST API.
pub const API_BASE_URL: &str = "https://api.twitter.com/";

/// Default base URL of the streaming API.
pub const STREAM_BASE_URL: &str = "https://stream.twitter.com/";

/// Timeout for REST requests. Streams have no overall timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the Twitter v1.1 REST and streaming APIs.
///
/// Every request is signed with OAuth 1.0a using the configured credentials.
///
/// # Examples
///
/// ```no_run
/// use harvester_client::{Credentials, TwitterClient};
/// use harvester_core::RecordSource;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TwitterClient::new(Credentials {
///     consumer_key: "key".into(),
///     consumer_secret: "secret".into(),
///     token: "token".into(),
///     token_secret: "token-secret".into(),
/// })?;
/// let tweets = client.fetch_user_timeline("rustlang", 20).await?;
/// println!("Fetched {} tweets", tweets.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TwitterClient {
    client: Client,
    credentials: Credentials,
    api_base: Url,
    stream_base: Url,
}

impl TwitterClient {
    /// Creates a client for the public Twitter endpoints.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Client` if the HTTP client cannot be built.
    pub fn new(credentials: Credentials) -> Result<Self, HarvestError> {
        Self::with_base_urls(credentials, API_BASE_URL, STREAM_BASE_URL)
    }

    /// Creates a client against custom REST and streaming hosts.
    pub fn with_base_urls(
        credentials: Credentials,
        api_base: &str,
        stream_base: &str,
    ) -> Result<Self, HarvestError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| HarvestError::Client(format!("Invalid API URL {}: {}", api_base, e)))?;
        let stream_base = Url::parse(stream_base).map_err(|e| {
            HarvestError::Client(format!("Invalid stream URL {}: {}", stream_base, e))
        })?;

        let client = Client::builder()
            .user_agent(concat!("twitter-harvester/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| HarvestError::Client(e.to_string()))?;

        Ok(Self {
            client,
            credentials,
            api_base,
            stream_base,
        })
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url, HarvestError> {
        base.join(path)
            .map_err(|e| HarvestError::Client(format!("Invalid endpoint {}: {}", path, e)))
    }

    async fn signed_get(
        &self,
        url: Url,
        params: &[(String, String)],
        timeout: Option<Duration>,
    ) -> Result<Response, reqwest::Error> {
        let auth = authorization_header(&self.credentials, "GET", &url, params);
        let mut request = self
            .client
            .get(url)
            .query(params)
            .header(reqwest::header::AUTHORIZATION, auth);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        request.send().await
    }

    async fn signed_post(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> Result<Response, reqwest::Error> {
        let auth = authorization_header(&self.credentials, "POST", &url, params);
        self.client
            .post(url)
            .form(params)
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
    }

    fn into_stream(resp: Response) -> Result<UnitStream, HarvestError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(HarvestError::StreamConnectError(format!(
                "HTTP {} from {}",
                status.as_u16(),
                resp.url()
            )));
        }

        let chunks = resp
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(|e| e.to_string()))
            .boxed();
        Ok(unit_stream(chunks))
    }
}

#[async_trait]
impl RecordSource for TwitterClient {
    async fn fetch_user_timeline(
        &self,
        screen_name: &str,
        count: u64,
    ) -> Result<Vec<Record>, HarvestError> {
        let fetch_failed = |message: String| HarvestError::SourceFetchFailed {
            account: screen_name.to_string(),
            message,
        };

        let url = Self::endpoint(&self.api_base, "1.1/statuses/user_timeline.json")?;
        let mut params = vec![("screen_name".to_string(), screen_name.to_string())];
        if count > 0 {
            params.push(("count".to_string(), count.to_string()));
        }

        let resp = self
            .signed_get(
                url,
                &params,
                Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
            )
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_failed(format!(
                "HTTP {} from {}",
                status.as_u16(),
                resp.url()
            )));
        }

        let units: Vec<Value> = resp
            .json()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        let total = units.len();
        let records: Vec<Record> = units.into_iter().filter_map(Record::from_unit).collect();
        if records.len() < total {
            warn!(
                account = screen_name,
                dropped = total - records.len(),
                "Dropped malformed timeline entries"
            );
        }

        Ok(records)
    }

    async fn open_sample(&self) -> Result<UnitStream, HarvestError> {
        let url = Self::endpoint(&self.stream_base, "1.1/statuses/sample.json")?;
        let resp = self
            .signed_get(url, &[], None)
            .await
            .map_err(|e| HarvestError::StreamConnectError(e.to_string()))?;
        Self::into_stream(resp)
    }

    async fn open_filter(&self, track: &str) -> Result<UnitStream, HarvestError> {
        let url = Self::endpoint(&self.stream_base, "1.1/statuses/filter.json")?;
        let params = vec![("track".to_string(), track.to_string())];
        let resp = self
            .signed_post(url, &params)
            .await
            .map_err(|e| HarvestError::StreamConnectError(e.to_string()))?;
        Self::into_stream(resp)
    }
}

struct LineReader {
    chunks: BoxStream<'static, Result<Vec<u8>, String>>,
    buffer: Vec<u8>,
    done: bool,
}

/// Splits a chunked body into newline-delimited JSON units.
///
/// Blank keep-alive lines and lines that are not JSON objects are skipped.
/// A transport error is yielded once and ends the sequence.
pub fn unit_stream(chunks: BoxStream<'static, Result<Vec<u8>, String>>) -> UnitStream {
    let reader = LineReader {
        chunks,
        buffer: Vec::new(),
        done: false,
    };

    stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(pos) = reader.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = reader.buffer.drain(..=pos).collect();
                if let Some(unit) = parse_unit(&line) {
                    return Some((Ok(unit), reader));
                }
                continue;
            }

            if reader.done {
                let rest = std::mem::take(&mut reader.buffer);
                return parse_unit(&rest).map(|unit| (Ok(unit), reader));
            }

            match reader.chunks.next().await {
                Some(Ok(chunk)) => reader.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    reader.done = true;
                    reader.buffer.clear();
                    return Some((
                        Err(HarvestError::Client(format!("Stream read failed: {}", e))),
                        reader,
                    ));
                }
                None => reader.done = true,
            }
        }
    })
    .boxed()
}

fn parse_unit(line: &[u8]) -> Option<Value> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_slice::<Value>(line) {
        Ok(unit) if unit.is_object() => Some(unit),
        Ok(_) => {
            debug!("Skipping non-object stream line");
            None
        }
        Err(e) => {
            debug!(error = %e, "Skipping unparseable stream line");
            None
        }
    }
}
