//! # Open-Meteo Weather Fetching
//!
//! This module handles the network side of a refresh: one HTTP request to the
//! Open-Meteo forecast API and the conversion of its JSON into a
//! [`WeatherSnapshot`].
//!
//! ## Data Source
//!
//! ### Open-Meteo
//! - **URL**: https://api.open-meteo.com/v1/forecast (free, no API key)
//! - **Format**: JSON with `current`, `hourly` and `daily` blocks
//! - **Timezone**: `auto`, so hourly and daily timestamps are local to the location
//!
//! ### Processing Pipeline
//! 1. **Fetch**: HTTP GET with the coordinates and the requested variables
//! 2. **Decode**: `serde_json` into the raw response structs below
//! 3. **Select**: 24 hourly samples starting at the current hour, the first 5 days
//! 4. **Return**: a complete snapshot, or an error and no partial data
//!
//! ## Error Handling
//! - **Network / HTTP status**: [`WeatherError::Http`]
//! - **Malformed JSON**: [`WeatherError::Json`]
//! - **Too few rows or null values**: [`WeatherError::Incomplete`]
//!
//! The caller never sees a half-filled snapshot. On error the panel keeps
//! showing the last good one and retries on the next refresh tick.

use crate::{
    CurrentConditions, ForecastDayRecord, Location, Series, WeatherSnapshot, FORECAST_DAYS,
    HOURLY_SAMPLES,
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Variables requested for the `current` block.
const CURRENT_VARS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,weather_code,surface_pressure,wind_speed_10m";

/// Variables requested for the `hourly` block.
const HOURLY_VARS: &str = "temperature_2m,relative_humidity_2m";

/// Variables requested for the `daily` block.
const DAILY_VARS: &str =
    "weather_code,temperature_2m_max,temperature_2m_min,precipitation_probability_max";

/// Open-Meteo timestamp format for hourly and current values.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Errors that can occur while fetching and decoding a forecast.
#[derive(Error, Debug)]
pub enum WeatherError {
    /// HTTP request failed (network, timeout, or non-2xx status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("invalid forecast JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Response decoded but lacked required rows or values
    #[error("incomplete forecast: {0}")]
    Incomplete(&'static str),
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    hourly: HourlyBlock,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: String,
    temperature_2m: f32,
    relative_humidity_2m: f32,
    apparent_temperature: f32,
    precipitation: f32,
    weather_code: u8,
    surface_pressure: f32,
    wind_speed_10m: f32,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f32>>,
    relative_humidity_2m: Vec<Option<f32>>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Vec<NaiveDate>,
    weather_code: Vec<Option<u8>>,
    temperature_2m_max: Vec<Option<f32>>,
    temperature_2m_min: Vec<Option<f32>>,
    precipitation_probability_max: Vec<Option<u8>>,
}

/// Fetch the forecast for `location` and build a snapshot.
///
/// # Example
/// ```no_run
/// use weather_panel_lib::{weather_data, Location};
///
/// # async fn run() -> Result<(), weather_data::WeatherError> {
/// let client = reqwest::Client::new();
/// let here = Location { name: "Humenné, SK".into(), latitude: 48.93, longitude: 21.9 };
/// let snapshot = weather_data::fetch(&client, "https://api.open-meteo.com/v1/forecast", &here).await?;
/// println!("{:.0}°C", snapshot.current.temperature);
/// # Ok(())
/// # }
/// ```
pub async fn fetch(
    client: &reqwest::Client,
    forecast_url: &str,
    location: &Location,
) -> Result<WeatherSnapshot, WeatherError> {
    debug!(
        "Fetching forecast for {} ({:.4}, {:.4})",
        location.name, location.latitude, location.longitude
    );

    let body = client
        .get(forecast_url)
        .query(&[
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("current", CURRENT_VARS.to_string()),
            ("hourly", HOURLY_VARS.to_string()),
            ("daily", DAILY_VARS.to_string()),
            ("timezone", "auto".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    parse_forecast(&body, location.clone(), Local::now())
}

/// Decode an Open-Meteo response body into a snapshot.
pub fn parse_forecast(
    body: &str,
    location: Location,
    fetched_at: DateTime<Local>,
) -> Result<WeatherSnapshot, WeatherError> {
    let response: ForecastResponse = serde_json::from_str(body)?;

    let current = CurrentConditions {
        temperature: response.current.temperature_2m,
        apparent_temperature: response.current.apparent_temperature,
        relative_humidity: response.current.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
        surface_pressure: response.current.surface_pressure,
        wind_speed: response.current.wind_speed_10m,
        weather_code: response.current.weather_code,
        precipitation: response.current.precipitation,
    };

    let start = hourly_start(&response.hourly.time, &response.current.time);
    let temperatures = take_hourly(&response.hourly.temperature_2m, start)?;
    let humidities = take_hourly(&response.hourly.relative_humidity_2m, start)?;

    Ok(WeatherSnapshot {
        location,
        current,
        hourly_temperature: Series::with_data_range(temperatures),
        // Humidity always spans the full percentage scale
        hourly_humidity: Series::new(humidities, 0.0, 100.0),
        forecast: forecast_days(&response.daily)?,
        fetched_at,
    })
}

/// Index of the first hourly row at or after the hour of `current_time`.
/// Falls back to row 0 when timestamps don't parse.
fn hourly_start(times: &[String], current_time: &str) -> usize {
    let Ok(now) = NaiveDateTime::parse_from_str(current_time, TIME_FORMAT) else {
        return 0;
    };
    let hour = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(now);

    times
        .iter()
        .position(|t| {
            NaiveDateTime::parse_from_str(t, TIME_FORMAT)
                .map(|t| t >= hour)
                .unwrap_or(false)
        })
        .unwrap_or(0)
}

fn take_hourly(values: &[Option<f32>], start: usize) -> Result<Vec<f32>, WeatherError> {
    let window = values
        .get(start..start + HOURLY_SAMPLES)
        .ok_or(WeatherError::Incomplete("fewer than 24 hourly rows"))?;
    window
        .iter()
        .map(|v| v.ok_or(WeatherError::Incomplete("null hourly value")))
        .collect()
}

fn forecast_days(daily: &DailyBlock) -> Result<[ForecastDayRecord; FORECAST_DAYS], WeatherError> {
    let rows = daily
        .time
        .len()
        .min(daily.weather_code.len())
        .min(daily.temperature_2m_max.len())
        .min(daily.temperature_2m_min.len());
    if rows < FORECAST_DAYS {
        return Err(WeatherError::Incomplete("fewer than 5 daily rows"));
    }

    let mut days = Vec::with_capacity(FORECAST_DAYS);
    for i in 0..FORECAST_DAYS {
        let date = daily.time[i];
        let label = if i == 0 {
            "Today".to_string()
        } else {
            date.format("%a").to_string()
        };
        days.push(ForecastDayRecord {
            date,
            label,
            icon_code: daily.weather_code[i].ok_or(WeatherError::Incomplete("null daily code"))?,
            high_temp: daily.temperature_2m_max[i]
                .ok_or(WeatherError::Incomplete("null daily maximum"))?,
            low_temp: daily.temperature_2m_min[i]
                .ok_or(WeatherError::Incomplete("null daily minimum"))?,
            // Probability is often missing for later days; treat as dry
            precipitation_probability: daily
                .precipitation_probability_max
                .get(i)
                .copied()
                .flatten()
                .unwrap_or(0),
        });
    }

    days.try_into()
        .map_err(|_| WeatherError::Incomplete("forecast day count"))
}
