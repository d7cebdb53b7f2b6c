//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! Reference: <https://developer.twitter.com/en/docs/authentication/oauth-1-0a/creating-a-signature>

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

/// RFC 3986 unreserved characters are the only ones left unencoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Consumer credentials plus the user's access token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Builds the `Authorization` header for a request.
///
/// `params` are the query or form parameters the request will carry.
/// `url` must not contain a query string.
pub fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &Url,
    params: &[(String, String)],
) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string();
    sign(credentials, method, url, params, &nonce, &timestamp)
}

pub(crate) fn sign(
    credentials: &Credentials,
    method: &str,
    url: &Url,
    params: &[(String, String)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let oauth_params = vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .chain(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url.as_str()),
        encode(&parameter_string)
    );

    let signing_key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(&credentials.token_secret)
    );

    // HMAC accepts keys of any length
    let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC-SHA1 accepts any key length"));
    mac.update(base_string.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let mut header_params: Vec<(&str, String)> = oauth_params
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect();
    header_params.push(("oauth_signature", signature));
    header_params.sort();

    let fields = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", fields)
}
