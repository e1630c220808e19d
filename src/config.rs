//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! weather-config.toml file. It provides a centralized way to configure the
//! location, display hardware, timer intervals and API endpoints.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "weather-config.toml";

/// Application configuration loaded from weather-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where to fetch weather for
    pub location: LocationConfig,
    /// Display and input hardware
    pub display: DisplayConfig,
    /// Timer intervals
    pub schedule: ScheduleConfig,
    /// Remote endpoints
    pub api: ApiConfig,
}

/// Location settings
///
/// Resolution order: `city` (geocoded) → `resolve_by_ip` → fixed coordinates.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Name shown in the page header when using fixed coordinates
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// City name to geocode instead of using the fixed coordinates
    pub city: Option<String>,
    /// Look the location up from the public IP address
    pub resolve_by_ip: bool,
}

/// Display and input hardware configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// LCD width in pixels
    pub width: u32,
    /// LCD height in pixels
    pub height: u32,
    /// Linux framebuffer device the LCD is bound to
    pub framebuffer: String,
    /// evdev touchscreen device; no touch input when unset
    pub touch_device: Option<String>,
}

/// Timer configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds each page stays visible during auto-rotation
    pub rotation_secs: u64,
    /// Minutes between weather refreshes
    pub refresh_minutes: u64,
    /// Seconds between clock redraws
    pub clock_secs: u64,
    /// Start with auto-rotation enabled
    pub auto_rotate: bool,
}

/// Remote API endpoints
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Open-Meteo forecast endpoint
    pub forecast_url: String,
    /// Open-Meteo geocoding endpoint
    pub geocoding_url: String,
    /// IP geolocation endpoint returning JSON
    pub ip_lookup_url: String,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            name: "Humenné, SK".to_string(),
            latitude: 48.9333,
            longitude: 21.9,
            city: None,
            resolve_by_ip: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 480,  // 3.5" SPI LCD
            height: 320, // 3.5" SPI LCD
            framebuffer: "/dev/fb1".to_string(),
            touch_device: None,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            rotation_secs: 10,
            refresh_minutes: 10,
            clock_secs: 1,
            auto_rotate: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            ip_lookup_url: "http://ip-api.com/json/".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ScheduleConfig {
    /// Raise zero intervals to one unit, logging each change.
    ///
    /// A zero interval would make the loop refresh, rotate or redraw on every
    /// turn.
    pub fn sanitize(&mut self) {
        for (name, value) in [
            ("rotation_secs", &mut self.rotation_secs),
            ("refresh_minutes", &mut self.refresh_minutes),
            ("clock_secs", &mut self.clock_secs),
        ] {
            if *value == 0 {
                warn!("schedule.{} = 0 is not allowed, using 1", name);
                *value = 1;
            }
        }
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes * 60)
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_secs(self.clock_secs)
    }
}

impl Config {
    /// Load configuration from weather-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(mut config) => {
                    config.schedule.sanitize();
                    info!("Loaded configuration for location: {}", config.location.name);
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration (Humenné, SK)");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration (Humenné, SK)");
                Self::default()
            }
        }
    }

    /// Save current configuration to the specified path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
