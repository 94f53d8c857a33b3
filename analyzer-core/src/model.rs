use chrono::{DateTime, Utc};
use serde::Serialize;

/// One 3-hour forecast sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: i64,
    pub temperature_c: f64,
    /// Upstream label, `YYYY-MM-DD HH:MM:SS`.
    pub label: String,
}

impl ForecastPoint {
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Date part of the label (everything before the first space).
    pub fn date(&self) -> &str {
        self.label.split(' ').next().unwrap_or_default()
    }
}

/// A parsed upstream forecast for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResponse {
    pub city_name: String,
    pub points: Vec<ForecastPoint>,
}

/// Compact 7-day summary. This is both the cached value and the wire response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSummary {
    pub city: String,
    pub average_temperature: f64,
    pub hottest_day: Option<String>,
    pub coldest_day: Option<String>,
}
