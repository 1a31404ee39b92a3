//! Core library for the `apiclient` CLI.
//!
//! This crate defines:
//! - A fallback orchestrator that tries data providers in priority order,
//!   with bounded exponential backoff
//! - Provider descriptors and per-provider response extraction
//!   (bitcoin price, weather, exchange rates)
//! - Usage statistics and an optional in-memory response cache
//! - Configuration handling
//!
//! It is used by `apiclient-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;
pub mod retry;
pub mod stats;

pub use client::{ApiClient, default_client};
pub use config::{ClientConfig, Endpoints};
pub use error::{AttemptError, LookupError, SourceFailure};
pub use model::{ExchangeRate, PriceQuote, WeatherReport, envelope};
pub use provider::ProviderId;
pub use retry::RetryPolicy;
pub use stats::Statistics;
