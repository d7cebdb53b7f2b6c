//! Harvester Client - Transport for the Twitter APIs
//!
//! This crate provides the [`TwitterClient`], which implements the core's
//! [`RecordSource`](harvester_core::RecordSource) over:
//!
//! - the REST `statuses/user_timeline` endpoint (batch mode)
//! - the streaming `statuses/sample` and `statuses/filter` endpoints (stream mode)
//!
//! Requests are signed with OAuth 1.0a, see [`oauth`].

pub mod oauth;
pub mod twitter;

pub use oauth::Credentials;
pub use twitter::TwitterClient;
