//! Layered configuration resolution.
//!
//! Configuration is read from an ordered list of YAML files. Each existing file
//! is parsed, checked against the recognized fields, and merged key-by-key into
//! the result so that later files override earlier ones.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::HarvestError;

/// Keys a configuration file may define.
pub const CONFIG_FIELDS: [&str; 3] = ["app-name", "consumer-key", "consumer-secret"];

/// System-wide configuration file, lowest precedence.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/twitter-harvester.conf";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "./.twitter-harvester.conf";

/// Name of the per-user directory under the home directory.
pub const USER_DIR_NAME: &str = ".twitter-harvester";

/// Returns the per-user harvester directory (`~/.twitter-harvester`).
pub fn user_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(USER_DIR_NAME))
}

/// Returns the default location of the user token file.
pub fn default_credentials_path() -> Option<PathBuf> {
    user_dir().map(|dir| dir.join("credentials"))
}

/// Returns the well-known configuration sources in precedence order.
///
/// The system path comes first, then the user path (when a home directory is
/// known), then the working-directory path.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    if let Some(dir) = user_dir() {
        paths.push(dir.join("config"));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG_PATH));
    paths
}

/// Merged configuration values keyed by recognized field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

/// The application credentials every run requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_name: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overwrites this map's values with every value in `other`.
    pub fn merge(&mut self, other: Settings) {
        self.values.extend(other.values);
    }

    /// Checks that all recognized fields are present and returns them.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::MissingCredentialFields` naming every absent field.
    pub fn require_app_credentials(&self) -> Result<AppCredentials, HarvestError> {
        let missing: Vec<String> = CONFIG_FIELDS
            .iter()
            .filter(|field| !self.values.contains_key(**field))
            .map(|field| field.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(HarvestError::MissingCredentialFields(missing));
        }

        Ok(AppCredentials {
            app_name: self.values["app-name"].clone(),
            consumer_key: self.values["consumer-key"].clone(),
            consumer_secret: self.values["consumer-secret"].clone(),
        })
    }
}

/// Parses the contents of a single configuration file.
///
/// The document must be a YAML mapping. Scalar values (strings, numbers and
/// booleans) are kept as their string form.
///
/// # Errors
///
/// - `UnknownConfigField` if any top-level key is not in [`CONFIG_FIELDS`]
/// - `InvalidConfigFormat` if the document is not a mapping, or a key or value
///   is not a scalar
pub fn parse_config(path: &Path, contents: &str) -> Result<Settings, HarvestError> {
    let invalid = || HarvestError::InvalidConfigFormat {
        path: path.to_path_buf(),
    };

    let document: serde_yaml::Value = serde_yaml::from_str(contents).map_err(|e| {
        debug!(path = %path.display(), error = %e, "Config parse failed");
        invalid()
    })?;
    let serde_yaml::Value::Mapping(mapping) = document else {
        return Err(invalid());
    };

    let mut entries = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = scalar_to_string(&key).ok_or_else(invalid)?;
        entries.push((key, value));
    }

    if let Some((field, _)) = entries
        .iter()
        .find(|(key, _)| !CONFIG_FIELDS.contains(&key.as_str()))
    {
        return Err(HarvestError::UnknownConfigField {
            path: path.to_path_buf(),
            field: field.clone(),
        });
    }

    let mut values = BTreeMap::new();
    for (key, value) in entries {
        let value = scalar_to_string(&value).ok_or_else(invalid)?;
        values.insert(key, value);
    }

    Ok(Settings { values })
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Resolves settings from `sources`, then from `explicit` if given.
///
/// Sources that do not exist are skipped. The explicit path has the highest
/// precedence and must exist. Presence of the required fields is not checked
/// here, see [`Settings::require_app_credentials`].
pub fn resolve_settings(
    sources: &[PathBuf],
    explicit: Option<&Path>,
) -> Result<Settings, HarvestError> {
    let mut settings = Settings::new();

    for path in sources {
        if !path.exists() {
            continue;
        }
        settings.merge(load_file(path)?);
    }

    if let Some(path) = explicit {
        settings.merge(load_file(path)?);
    }

    Ok(settings)
}

fn load_file(path: &Path) -> Result<Settings, HarvestError> {
    let contents = std::fs::read_to_string(path).map_err(|source| HarvestError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = parse_config(path, &contents)?;
    debug!(path = %path.display(), keys = settings.len(), "Loaded configuration file");
    Ok(settings)
}
