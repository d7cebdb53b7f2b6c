use clap::{Parser, ValueEnum};
use harvester_core::{HarvestOptions, OutputFormat};
use std::path::PathBuf;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "twitter-harvester")]
#[command(author, version, about = "Harvest tweets from user timelines or the live stream")]
#[command(after_help = "Examples:
  twitter-harvester -n 100 -o sample.txt          # 100 tweets from the sample stream
  twitter-harvester -f rust,tokio --format json   # filtered stream until Ctrl+C
  twitter-harvester -u rustlang -n 50             # 50 most recent tweets of @rustlang
  twitter-harvester --users-file accounts.txt     # timelines of every listed account")]
pub struct Config {
    /// Additional configuration file, read after the default locations
    #[arg(short, long, value_name = "PATH", env = "TWITTER_HARVESTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// File holding the OAuth access token and secret (one per line)
    #[arg(long, value_name = "PATH", env = "TWITTER_HARVESTER_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Number of tweets to harvest. 0 keeps streaming until stopped with Ctrl+C,
    /// or fetches the API default per account
    #[arg(short = 'n', long, default_value_t = 0, value_name = "N")]
    pub num_tweets: u64,

    /// Output file, `-` for standard output
    #[arg(short, long, default_value = "-", value_name = "PATH")]
    pub outfile: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::HumanReadable)]
    pub format: Format,

    /// Fetch tweets from this account
    #[arg(short, long, value_name = "HANDLE")]
    pub user: Option<String>,

    /// Fetch tweets from the accounts listed in this file (one per line)
    #[arg(long, value_name = "PATH")]
    pub users_file: Option<PathBuf>,

    /// Filter the stream by keywords (comma-separated list)
    #[arg(short, long, value_name = "TERMS")]
    pub filter: Option<String>,

    /// Filter the stream by the keywords listed in this file (one per line)
    #[arg(long, value_name = "PATH")]
    pub filters_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Options relevant to acquisition mode selection.
    pub fn harvest_options(&self) -> HarvestOptions {
        HarvestOptions {
            count: self.num_tweets,
            user: self.user.clone(),
            users_file: self.users_file.clone(),
            filter: self.filter.clone(),
            filters_file: self.filters_file.clone(),
        }
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Tweet text only, one per line
    TextOnly,
    /// Author, timestamp and text, blocks separated by a blank line
    HumanReadable,
    /// Full tweet payload as JSON Lines
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::TextOnly => OutputFormat::TextOnly,
            Format::HumanReadable => OutputFormat::HumanReadable,
            Format::Json => OutputFormat::Json,
        }
    }
}
