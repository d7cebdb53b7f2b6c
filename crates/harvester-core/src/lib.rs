//! Harvester Core - Harvesting engine, domain types, error handling, and configuration.

pub mod batch;
pub mod config;
pub mod error;
pub mod format;
pub mod harvest;
pub mod models;
pub mod request;
pub mod shutdown;
pub mod sink;
pub mod source;
pub mod stats;
pub mod stream;

pub use batch::BatchHarvester;
pub use config::{
    default_config_paths, default_credentials_path, resolve_settings, user_dir, AppCredentials,
    Settings, CONFIG_FIELDS,
};
pub use error::HarvestError;
pub use format::OutputFormat;
pub use harvest::{run_harvest, HarvestReport};
pub use models::{decode_entities, Record, User};
pub use request::{HarvestOptions, HarvestRequest, StreamFilter};
pub use shutdown::{shutdown_channel, ShutdownCoordinator, ShutdownToken, ShutdownTrigger};
pub use sink::{OutputSink, SinkKind};
pub use source::{RecordSource, UnitStream};
pub use stats::{AccountHarvestResult, BatchHarvestSummary, StreamStats, UnitOutcome};
pub use stream::{HarvestPhase, StopReason, StreamHarvester, StreamOutcome};
