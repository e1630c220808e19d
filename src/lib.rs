//! # Weather Panel Core Library
//!
//! This library provides the data structures and state machines behind the
//! weather panel: a small LCD (480×320 on a Raspberry Pi) that cycles through a
//! fixed set of pages and renders simple time-series charts.
//!
//! ## Design Philosophy
//!
//! ### Core vs. glue
//! - **Core**: page rotation with gesture/manual override ([`pages`],
//!   [`gesture`], [`scheduler`]) and the chart renderer ([`graph`])
//! - **Glue**: HTTP fetches ([`weather_data`], [`location`]), the refresh worker
//!   ([`provider`]), and page layout ([`renderer`])
//!
//! The glue only ever hands the core a finished [`WeatherSnapshot`] or an explicit
//! "unavailable" signal. The core never waits on the network.
//!
//! ### Memory
//! - **Fixed-size forecast**: exactly [`FORECAST_DAYS`] records in an array
//! - **Bounded series**: hourly charts hold [`HOURLY_SAMPLES`] samples
//! - **Primitive types**: `f32` for measurements, `u8` for codes and percentages
//!
//! ## Data Flow
//! 1. **Worker**: fetch Open-Meteo JSON → build [`WeatherSnapshot`] → send over channel
//! 2. **Loop**: [`dashboard::Dashboard`] applies the snapshot within one event-loop turn
//! 3. **Display**: visible page is drawn into the framebuffer; chart pages go through
//!    [`graph::GraphRenderer`]

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod canvas;
pub mod config;
pub mod dashboard;
pub mod framebuffer;
pub mod gesture;
pub mod graph;
pub mod input;
pub mod location;
pub mod pages;
pub mod provider;
pub mod renderer;
pub mod scheduler;
pub mod weather_data;
pub mod wmo;

/// Number of forecast days shown on the forecast page.
pub const FORECAST_DAYS: usize = 5;

/// Number of hourly samples consumed for the chart page (one day).
pub const HOURLY_SAMPLES: usize = 24;

/// An ordered sequence of numeric samples with a declared render range.
///
/// The range is declared separately from the data so several charts can share
/// a scale. When `min == max` the range is degenerate and the renderer draws a
/// flat line through the middle of the plot.
///
/// # Example
/// ```
/// use weather_panel_lib::Series;
///
/// let series = Series::with_data_range(vec![3.0, 7.5, 5.0]);
/// assert_eq!(series.min, 3.0);
/// assert_eq!(series.max, 7.5);
/// assert!(!series.is_degenerate());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Samples in display order (oldest first)
    pub samples: Vec<f32>,
    /// Lower bound of the render range
    pub min: f32,
    /// Upper bound of the render range
    pub max: f32,
}

impl Series {
    pub fn new(samples: Vec<f32>, min: f32, max: f32) -> Self {
        Self { samples, min, max }
    }

    /// Build a series whose render range is the min/max of its own samples.
    /// An empty series gets the range `[0, 0]`.
    pub fn with_data_range(samples: Vec<f32>) -> Self {
        if samples.is_empty() {
            return Self::new(samples, 0.0, 0.0);
        }
        let (min, max) = samples
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });
        Self::new(samples, min, max)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True when the render range has zero width.
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }
}

/// Weather at the moment of the fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Air temperature at 2 m, °C
    pub temperature: f32,
    /// Apparent ("feels like") temperature, °C
    pub apparent_temperature: f32,
    /// Relative humidity, %
    pub relative_humidity: u8,
    /// Surface pressure, hPa
    pub surface_pressure: f32,
    /// Wind speed at 10 m, km/h
    pub wind_speed: f32,
    /// WMO weather classification code
    pub weather_code: u8,
    /// Precipitation, mm
    pub precipitation: f32,
}

/// One day of the forecast page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastDayRecord {
    /// Calendar date of the forecast
    pub date: NaiveDate,
    /// Short label shown above the icon (e.g. "Mon")
    pub label: String,
    /// WMO weather code used to pick the icon
    pub icon_code: u8,
    /// Daily maximum temperature, °C
    pub high_temp: f32,
    /// Daily minimum temperature, °C
    pub low_temp: f32,
    /// Maximum precipitation probability for the day, %
    pub precipitation_probability: u8,
}

/// A resolved place to fetch weather for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Name shown in the page header (e.g. "Humenné, SK")
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Everything the pages need, produced by one successful refresh.
///
/// # Example
/// ```
/// use weather_panel_lib::{Series, WeatherSnapshot};
///
/// fn chart_len(snapshot: &WeatherSnapshot) -> usize {
///     snapshot.hourly_temperature.len()
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub current: CurrentConditions,
    /// Next 24 hourly temperatures, °C
    pub hourly_temperature: Series,
    /// Next 24 hourly relative humidities, %
    pub hourly_humidity: Series,
    /// Five days, date ascending
    pub forecast: [ForecastDayRecord; FORECAST_DAYS],
    /// Local time the snapshot was assembled
    pub fetched_at: DateTime<Local>,
}
