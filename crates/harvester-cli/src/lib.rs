//! Twitter Harvester CLI - Command-line interface for the harvesting engine
//!
//! This crate provides the CLI application that ties together all harvester components.

pub mod config;
pub mod credentials;

pub use config::{Config, Format};
pub use credentials::{load_access_token, AccessToken};
