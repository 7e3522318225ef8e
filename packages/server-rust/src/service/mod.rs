//! Listing workflows and server policy.
//!
//! - [`config`]: [`ServerConfig`] policy flags, collection names, abuse thresholds
//! - [`listing`]: [`ListingService`] create / edit / update / remove pipeline

pub mod config;
pub mod listing;

pub use config::{AbuseConfig, ServerConfig};
pub use listing::{EditView, FormView, ListingService, SubmitError, WriteStage};
