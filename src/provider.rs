//! # Background Refresh Worker
//!
//! Network requests never run on the interactive loop. The loop asks for a
//! refresh through a [`RefreshHandle`] and later receives exactly one
//! [`DataUpdate`] per accepted request on a channel: either a complete snapshot
//! or an explicit "unavailable" signal.
//!
//! ## Request coalescing
//! The request channel holds one pending request. Asking again while a refresh
//! is queued is a no-op, so a slow network can't build up a backlog of fetches.

use crate::config::Config;
use crate::weather_data::{self, WeatherError};
use crate::{location, Location, WeatherSnapshot};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of one refresh, delivered to the interactive loop.
#[derive(Debug, Clone, PartialEq)]
pub enum DataUpdate {
    Snapshot(Box<WeatherSnapshot>),
    /// The refresh failed; the reason is for logs only
    Unavailable(String),
}

/// Anything that can produce a weather snapshot.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn snapshot(&self) -> Result<WeatherSnapshot, WeatherError>;
}

/// Open-Meteo backed source. The location is cached once a lookup succeeds;
/// until then every refresh tries again.
pub struct OpenMeteoSource {
    client: reqwest::Client,
    config: Config,
    location: OnceCell<Location>,
}

impl OpenMeteoSource {
    pub fn new(config: Config) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            location: OnceCell::new(),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    async fn snapshot(&self) -> Result<WeatherSnapshot, WeatherError> {
        let resolved = self
            .location
            .get_or_try_init(|| location::resolve(&self.client, &self.config.location, &self.config.api))
            .await;
        let location = match resolved {
            Ok(location) => location.clone(),
            Err(e) => {
                // Not cached: the lookup runs again on the next refresh
                warn!("Location lookup failed ({}), using fixed coordinates", e);
                location::fixed(&self.config.location)
            }
        };
        weather_data::fetch(&self.client, &self.config.api.forecast_url, &location).await
    }
}

/// Sender side used by the interactive loop to ask for a refresh.
#[derive(Clone, Debug)]
pub struct RefreshHandle {
    requests: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Queue a refresh. Returns false if one is already queued or the worker
    /// has stopped.
    pub fn request(&self) -> bool {
        match self.requests.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("Refresh already queued");
                false
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("Refresh worker has stopped");
                false
            }
        }
    }
}

/// Spawn the worker on the current tokio runtime.
///
/// The worker exits when every [`RefreshHandle`] is dropped or the update
/// receiver is closed.
pub fn spawn_refresh_worker<S>(source: S) -> (RefreshHandle, mpsc::Receiver<DataUpdate>, JoinHandle<()>)
where
    S: WeatherSource + 'static,
{
    let (request_tx, mut request_rx) = mpsc::channel::<()>(1);
    let (update_tx, update_rx) = mpsc::channel::<DataUpdate>(4);

    let task = tokio::spawn(async move {
        while request_rx.recv().await.is_some() {
            let update = match source.snapshot().await {
                Ok(snapshot) => {
                    info!(
                        "Weather refreshed for {}: {:.1}°C",
                        snapshot.location.name, snapshot.current.temperature
                    );
                    DataUpdate::Snapshot(Box::new(snapshot))
                }
                Err(error) => {
                    warn!("Weather refresh failed: {}", error);
                    DataUpdate::Unavailable(error.to_string())
                }
            };
            if update_tx.send(update).await.is_err() {
                debug!("Update receiver closed, stopping refresh worker");
                break;
            }
        }
    });

    (RefreshHandle { requests: request_tx }, update_rx, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather_data::{parse_forecast, tests::sample_body, tests::sample_location};
    use chrono::Local;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails every other call, starting with success.
    struct FlakySource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WeatherSource for FlakySource {
        async fn snapshot(&self) -> Result<WeatherSnapshot, WeatherError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call % 2 == 0 {
                parse_forecast(&sample_body(), sample_location(), Local::now())
            } else {
                Err(WeatherError::Incomplete("simulated outage"))
            }
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_snapshot_then_unavailable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (handle, mut updates, _task) = spawn_refresh_worker(FlakySource {
            calls: calls.clone(),
        });

        assert!(handle.request());
        let first = updates.recv().await.unwrap();
        assert!(matches!(first, DataUpdate::Snapshot(ref s) if s.current.temperature == 21.4));

        assert!(handle.request());
        let second = updates.recv().await.unwrap();
        assert!(matches!(second, DataUpdate::Unavailable(ref reason) if reason.contains("simulated outage")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_worker_stops_when_handles_dropped() {
        let (handle, mut updates, task) = spawn_refresh_worker(FlakySource {
            calls: Arc::new(AtomicUsize::new(0)),
        });
        drop(handle);
        task.await.unwrap();
        assert!(updates.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_location_lookup_is_retried() {
        let mut config = Config::default();
        config.location.city = Some("Košice".to_string());
        config.api.geocoding_url = "http://127.0.0.1:1/search".to_string();
        config.api.forecast_url = "http://127.0.0.1:1/forecast".to_string();
        config.api.timeout_secs = 2;
        let source = OpenMeteoSource::new(config).unwrap();

        assert!(source.snapshot().await.is_err());
        assert!(source.location.get().is_none());
    }

    #[tokio::test]
    async fn test_fixed_location_is_cached() {
        let mut config = Config::default();
        config.api.forecast_url = "http://127.0.0.1:1/forecast".to_string();
        let source = OpenMeteoSource::new(config.clone()).unwrap();

        assert!(source.snapshot().await.is_err());
        assert_eq!(source.location.get(), Some(&location::fixed(&config.location)));
    }
}
