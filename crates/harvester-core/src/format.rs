//! Rendering of records into the supported output formats.

use std::fmt;
use std::str::FromStr;

use crate::error::HarvestError;
use crate::models::Record;

/// Textual representation written to the sink for each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Body text only, one line per record
    TextOnly,
    /// Header line, body text, blank separator line
    #[default]
    HumanReadable,
    /// Full payload as one JSON object per line
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::TextOnly => "text-only",
            OutputFormat::HumanReadable => "human-readable",
            OutputFormat::Json => "json",
        }
    }

    /// Normalizes `record` and renders it, including trailing newlines.
    ///
    /// # Examples
    ///
    /// ```
    /// use harvester_core::{OutputFormat, Record};
    ///
    /// let record = Record::from_unit(serde_json::json!({
    ///     "created_at": "Wed Oct 10 20:19:24 +0000 2018",
    ///     "text": "1 &lt; 2",
    ///     "user": {"name": "Alice", "screen_name": "alice"}
    /// }))
    /// .unwrap();
    ///
    /// let out = OutputFormat::HumanReadable.render(record).unwrap();
    /// assert_eq!(
    ///     out,
    ///     ">>> Alice (@alice) - Wed Oct 10 20:19:24 +0000 2018\n1 < 2\n\n"
    /// );
    /// ```
    pub fn render(&self, record: Record) -> Result<String, HarvestError> {
        let record = record.normalized();

        let rendered = match self {
            OutputFormat::TextOnly => format!("{}\n", record.text),
            OutputFormat::HumanReadable => format!(
                ">>> {} (@{}) - {}\n{}\n\n",
                record.user.name, record.user.screen_name, record.created_at, record.text
            ),
            OutputFormat::Json => format!("{}\n", serde_json::to_string(&record)?),
        };

        Ok(rendered)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text-only" => Ok(OutputFormat::TextOnly),
            "human-readable" => Ok(OutputFormat::HumanReadable),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}
