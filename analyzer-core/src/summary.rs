//! Reduction of a forecast list into a [`WeatherSummary`].

use crate::model::{ForecastPoint, ForecastResponse, WeatherSummary};

/// 7 days of 3-hour samples.
pub const SUMMARY_WINDOW: usize = 7 * 8;

/// Summarise the first [`SUMMARY_WINDOW`] points of `points`.
///
/// Ties for hottest and coldest resolve to the earliest point.
pub fn reduce(points: &[ForecastPoint], city_name: &str) -> WeatherSummary {
    let window = &points[..points.len().min(SUMMARY_WINDOW)];

    let Some(first) = window.first() else {
        return WeatherSummary {
            city: city_name.to_string(),
            average_temperature: 0.0,
            hottest_day: None,
            coldest_day: None,
        };
    };

    let (hottest, coldest) = window.iter().skip(1).fold((first, first), |(hot, cold), p| {
        let hot = if p.temperature_c > hot.temperature_c { p } else { hot };
        let cold = if p.temperature_c < cold.temperature_c { p } else { cold };
        (hot, cold)
    });

    let mean = window.iter().map(|p| p.temperature_c).sum::<f64>() / window.len() as f64;

    WeatherSummary {
        city: city_name.to_string(),
        average_temperature: round_2dp(mean),
        hottest_day: Some(hottest.date().to_string()),
        coldest_day: Some(coldest.date().to_string()),
    }
}

pub fn summarize_forecast(forecast: &ForecastResponse) -> WeatherSummary {
    reduce(&forecast.points, &forecast.city_name)
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
