//! Location resolution.
//!
//! The panel fetches weather for one place, picked at startup from the config:
//! a typed city name (Open-Meteo geocoding), the public IP address
//! (ip-api.com), or fixed coordinates. A failed lookup is reported to the
//! caller, which shows the fixed coordinates until a later lookup succeeds.

use crate::config::{ApiConfig, LocationConfig};
use crate::Location;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no match for city {0:?}")]
    UnknownCity(String),

    #[error("IP lookup failed: {0}")]
    IpLookup(String),
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpLookupResponse {
    status: String,
    message: Option<String>,
    city: Option<String>,
    country_code: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Resolve the configured location.
///
/// Tries the city name, then the public IP, when configured. With no lookup
/// configured the fixed coordinates are the answer. When every configured
/// lookup fails the last error is returned, so the caller can fall back for
/// one refresh and try again on the next.
pub async fn resolve(
    client: &reqwest::Client,
    location: &LocationConfig,
    api: &ApiConfig,
) -> Result<Location, LocationError> {
    let mut failure = None;

    if let Some(city) = location.city.as_deref() {
        match by_city(client, &api.geocoding_url, city).await {
            Ok(found) => {
                info!("Resolved city {:?} to {}", city, found.name);
                return Ok(found);
            }
            Err(e) => {
                warn!("City lookup failed: {}", e);
                failure = Some(e);
            }
        }
    }

    if location.resolve_by_ip {
        match by_ip(client, &api.ip_lookup_url).await {
            Ok(found) => {
                info!("Resolved public IP to {}", found.name);
                return Ok(found);
            }
            Err(e) => {
                warn!("IP lookup failed: {}", e);
                failure = Some(e);
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(fixed(location)),
    }
}

/// The fixed coordinates from the config.
pub fn fixed(location: &LocationConfig) -> Location {
    Location {
        name: location.name.clone(),
        latitude: location.latitude,
        longitude: location.longitude,
    }
}

/// Geocode a city name, taking the best match.
pub async fn by_city(
    client: &reqwest::Client,
    geocoding_url: &str,
    city: &str,
) -> Result<Location, LocationError> {
    let body = client
        .get(geocoding_url)
        .query(&[("name", city), ("count", "1"), ("format", "json")])
        .send()
        .await?
        .error_for_status()?
        .json::<GeocodingResponse>()
        .await?;
    from_geocoding(body, city)
}

/// Locate the public IP address.
pub async fn by_ip(client: &reqwest::Client, ip_lookup_url: &str) -> Result<Location, LocationError> {
    let body = client
        .get(ip_lookup_url)
        .send()
        .await?
        .error_for_status()?
        .json::<IpLookupResponse>()
        .await?;
    from_ip_lookup(body)
}

fn display_name(name: &str, country_code: Option<&str>) -> String {
    match country_code {
        Some(code) if !code.is_empty() => format!("{name}, {code}"),
        _ => name.to_string(),
    }
}

fn from_geocoding(body: GeocodingResponse, city: &str) -> Result<Location, LocationError> {
    let best = body
        .results
        .into_iter()
        .next()
        .ok_or_else(|| LocationError::UnknownCity(city.to_string()))?;
    Ok(Location {
        name: display_name(&best.name, best.country_code.as_deref()),
        latitude: best.latitude,
        longitude: best.longitude,
    })
}

fn from_ip_lookup(body: IpLookupResponse) -> Result<Location, LocationError> {
    if body.status != "success" {
        return Err(LocationError::IpLookup(
            body.message.unwrap_or_else(|| body.status.clone()),
        ));
    }
    let (Some(lat), Some(lon)) = (body.lat, body.lon) else {
        return Err(LocationError::IpLookup("missing coordinates".to_string()));
    };
    let city = body.city.unwrap_or_else(|| "Unknown".to_string());
    Ok(Location {
        name: display_name(&city, body.country_code.as_deref()),
        latitude: lat,
        longitude: lon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocoding_best_match() {
        let body: GeocodingResponse = serde_json::from_str(
            r#"{"results":[{"name":"Košice","latitude":48.71395,"longitude":21.25808,"country_code":"SK","country":"Slovakia"}]}"#,
        )
        .unwrap();
        let found = from_geocoding(body, "kosice").unwrap();
        assert_eq!(found.name, "Košice, SK");
        assert_eq!(found.latitude, 48.71395);
    }

    #[test]
    fn test_geocoding_without_results() {
        let body: GeocodingResponse = serde_json::from_str(r#"{"generationtime_ms":0.5}"#).unwrap();
        assert!(matches!(
            from_geocoding(body, "Atlantis"),
            Err(LocationError::UnknownCity(c)) if c == "Atlantis"
        ));
    }

    #[test]
    fn test_ip_lookup_success() {
        let body: IpLookupResponse = serde_json::from_str(
            r#"{"status":"success","city":"Humenné","countryCode":"SK","lat":48.93,"lon":21.91}"#,
        )
        .unwrap();
        let found = from_ip_lookup(body).unwrap();
        assert_eq!(found.name, "Humenné, SK");
        assert_eq!(found.longitude, 21.91);
    }

    #[test]
    fn test_ip_lookup_failure_status() {
        let body: IpLookupResponse =
            serde_json::from_str(r#"{"status":"fail","message":"private range"}"#).unwrap();
        assert!(matches!(
            from_ip_lookup(body),
            Err(LocationError::IpLookup(m)) if m == "private range"
        ));
    }

    #[test]
    fn test_fixed_location() {
        let config = LocationConfig::default();
        let location = fixed(&config);
        assert_eq!(location.name, config.name);
        assert_eq!(location.latitude, config.latitude);
    }

    fn unreachable_api() -> ApiConfig {
        ApiConfig {
            geocoding_url: "http://127.0.0.1:1/search".to_string(),
            ip_lookup_url: "http://127.0.0.1:1/json/".to_string(),
            ..ApiConfig::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_without_lookups_uses_fixed() {
        let config = LocationConfig::default();
        let found = resolve(&reqwest::Client::new(), &config, &unreachable_api())
            .await
            .unwrap();
        assert_eq!(found, fixed(&config));
    }

    #[tokio::test]
    async fn test_resolve_reports_failed_city_lookup() {
        let config = LocationConfig {
            city: Some("Košice".to_string()),
            resolve_by_ip: true,
            ..LocationConfig::default()
        };
        let result = resolve(&reqwest::Client::new(), &config, &unreachable_api()).await;
        assert!(matches!(result, Err(LocationError::Http(_))));
    }
}
