use std::path::PathBuf;

use thiserror::Error;

/// Harvester-wide error types.
///
/// This enum covers every failure the harvesting engine can report. Configuration
/// and credential errors are fatal at startup; transport errors are fatal mid-run.
/// Records the transport delivers with missing fields are never errors, they are
/// filtered silently by the harvesters.
///
/// # Error Conversion
///
/// - `std::io::Error` → `HarvestError::Io`
/// - `serde_json::Error` → `HarvestError::Serialization`
///
/// # Examples
///
/// ```
/// use harvester_core::error::HarvestError;
///
/// let err = HarvestError::MissingCredentialFields(vec!["consumer-key".to_string()]);
/// assert!(err.is_fatal_at_startup());
/// ```
#[derive(Error, Debug)]
pub enum HarvestError {
    /// A configuration file did not parse to a key-value mapping.
    #[error("File {} is not a valid configuration file", .path.display())]
    InvalidConfigFormat { path: PathBuf },

    /// A configuration file contains a key outside the recognized fields.
    #[error("File {} contains an invalid field: {field}", .path.display())]
    UnknownConfigField { path: PathBuf, field: String },

    /// The merged settings lack one or more of the required OAuth fields.
    #[error("Configuration files do not have OAuth fields: {}", .0.join(", "))]
    MissingCredentialFields(Vec<String>),

    /// An explicitly requested configuration file could not be read.
    #[error("Cannot read configuration file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The user token pair could not be loaded.
    #[error("Credentials unavailable at {}: {reason}", .path.display())]
    CredentialsUnavailable { path: PathBuf, reason: String },

    /// An accounts or filters input file could not be read.
    #[error("Cannot read input file {}: {source}", .path.display())]
    InputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The live stream could not be established.
    #[error("Stream connection failed: {0}")]
    StreamConnectError(String),

    /// A timeline fetch for one account failed.
    #[error("Fetching tweets from @{account} failed: {message}")]
    SourceFetchFailed { account: String, message: String },

    /// Generic transport failure outside of a specific fetch.
    #[error("API Client error: {0}")]
    Client(String),

    /// Writing to the output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HarvestError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            HarvestError::MissingCredentialFields(fields) => format!(
                "Configuration files do not have OAuth fields ({}).\n   Add them to ~/.twitter-harvester/config or pass --config.",
                fields
                    .iter()
                    .map(|f| format!("'{}'", f))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            HarvestError::CredentialsUnavailable { path, reason } => format!(
                "No usable OAuth token at {} ({}).\n   The file must hold the access token and secret on two lines.",
                path.display(),
                reason
            ),
            HarvestError::StreamConnectError(msg) => {
                if msg.contains("401") {
                    "The streaming API rejected the credentials.\n   Check consumer-key, consumer-secret and the token file.".to_string()
                } else if msg.contains("420") || msg.contains("429") {
                    "The streaming API is rate limiting this account.\n   Wait a few minutes before reconnecting.".to_string()
                } else {
                    format!("Cannot connect to the stream: {}", msg)
                }
            }
            HarvestError::SourceFetchFailed { account, message } => {
                if message.contains("404") {
                    format!("Account @{} does not exist.", account)
                } else if message.contains("401") {
                    format!(
                        "Not authorized to read @{}.\n   The account may be protected.",
                        account
                    )
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        }
    }

    /// Returns true for errors that abort the run before any record is fetched.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            HarvestError::InvalidConfigFormat { .. }
                | HarvestError::UnknownConfigField { .. }
                | HarvestError::MissingCredentialFields(_)
                | HarvestError::ConfigRead { .. }
                | HarvestError::CredentialsUnavailable { .. }
                | HarvestError::InputFile { .. }
        )
    }
}
