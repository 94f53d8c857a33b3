use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};

use crate::{
    config::ApiConfig,
    error::FetchError,
    model::{ForecastPoint, ForecastResponse},
};

use super::ForecastClient;

/// OpenWeather 5-day / 3-hour forecast client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl OpenWeatherClient {
    /// Build a client whose requests are bounded by `config.timeout_secs`.
    pub fn new(config: &ApiConfig, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self::with_client(config, api_key, http))
    }

    pub fn with_client(config: &ApiConfig, api_key: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: api_key.into(),
            http,
        }
    }
}

#[async_trait]
impl ForecastClient for OpenWeatherClient {
    async fn fetch(&self, city: &str) -> Result<ForecastResponse, FetchError> {
        debug!(city, url = %self.base_url, "Fetching forecast from OpenWeather");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        let body = res.text().await.map_err(transport_error)?;

        if let Some(err) = classify_status(status, city) {
            error!(
                city,
                status = status.as_u16(),
                body = %truncate_body(&body),
                "OpenWeather forecast request failed"
            );
            return Err(err);
        }

        let parsed: OwForecastResponse =
            serde_json::from_str(&body).map_err(FetchError::UpstreamFormat)?;

        let forecast = parsed.into_forecast();

        if let (Some(first), Some(last)) = (forecast.points.first(), forecast.points.last()) {
            debug!(
                city = %forecast.city_name,
                points = forecast.points.len(),
                from = ?first.observed_at(),
                to = ?last.observed_at(),
                "OpenWeather forecast received"
            );
        }

        Ok(forecast)
    }
}

/// The request URL carries `appid`, so it is stripped before the error can reach a log.
fn transport_error(err: reqwest::Error) -> FetchError {
    FetchError::Transport(err.without_url())
}

/// Map a non-success status to its domain error. `None` means the body should be parsed.
pub(crate) fn classify_status(status: StatusCode, city: &str) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }

    let err = match status {
        StatusCode::NOT_FOUND => FetchError::CityNotFound(city.to_string()),
        StatusCode::UNAUTHORIZED => FetchError::Unauthorized,
        s if s.is_client_error() => FetchError::ClientError(s.as_u16()),
        s if s.is_server_error() => FetchError::ServiceUnavailable,
        s => FetchError::UnexpectedStatus(s.as_u16()),
    };

    Some(err)
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

impl OwForecastResponse {
    fn into_forecast(self) -> ForecastResponse {
        let points = self
            .list
            .into_iter()
            .map(|e| ForecastPoint {
                timestamp: e.dt,
                temperature_c: e.main.temp,
                label: e.dt_txt,
            })
            .collect();

        ForecastResponse { city_name: self.city.name, points }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
