//! Loading of the user's OAuth access token.
//!
//! Obtaining the token is out of scope; this only reads the token file in the
//! two-line layout (token, then secret).

use std::path::Path;

use harvester_core::HarvestError;

/// OAuth access token pair of the harvesting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
}

/// Reads the access token pair from `path`.
///
/// # Errors
///
/// Returns `HarvestError::CredentialsUnavailable` if the file is missing or
/// does not hold two non-empty lines.
pub fn load_access_token(path: &Path) -> Result<AccessToken, HarvestError> {
    let unavailable = |reason: String| HarvestError::CredentialsUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
    let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());

    match (lines.next(), lines.next()) {
        (Some(token), Some(secret)) => Ok(AccessToken {
            token: token.to_string(),
            secret: secret.to_string(),
        }),
        _ => Err(unavailable(
            "expected the token and secret on two lines".to_string(),
        )),
    }
}
