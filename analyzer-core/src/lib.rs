//! Core library for the weather analyzer service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The forecast client abstraction and its OpenWeather implementation
//! - The 7-day summary reducer
//! - A cached lookup service that coalesces concurrent requests per city
//!
//! It is used by `analyzer-server`, but carries no HTTP server code itself.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod service;
pub mod summary;

pub use config::{ApiConfig, CacheConfig, Config, ServerConfig};
pub use error::{FetchError, LookupError};
pub use model::{ForecastPoint, ForecastResponse, WeatherSummary};
pub use provider::{ForecastClient, OpenWeatherClient};
pub use service::{CacheStats, WeatherService};
pub use summary::{SUMMARY_WINDOW, reduce, summarize_forecast};
