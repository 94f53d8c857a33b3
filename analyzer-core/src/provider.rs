use crate::{error::FetchError, model::ForecastResponse};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Source of multi-day forecasts for a city.
///
/// One call is one upstream request; implementations never retry.
#[async_trait]
pub trait ForecastClient: Send + Sync + Debug {
    async fn fetch(&self, city: &str) -> Result<ForecastResponse, FetchError>;
}
