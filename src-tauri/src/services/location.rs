//! Device location for the complaint form
//!
//! One request asks for a fresh fix, falls back once to the last known
//! fix, and can be cancelled when the form is torn down.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A fix older than this is not reported as the current location
const CURRENT_FIX_MAX_AGE_SECS: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn is_enabled(&self) -> bool;

    async fn current_location(&self) -> Result<Option<Coordinates>>;

    /// Possibly stale fix kept by the platform
    async fn last_known_location(&self) -> Result<Option<Coordinates>>;
}

/// Get the device location, honouring `cancel`
pub async fn fetch_location(
    provider: &dyn LocationProvider,
    cancel: CancellationToken,
) -> Result<Coordinates> {
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!("Location request cancelled");
            Err(AppError::Location("Location request cancelled.".to_string()))
        }
        result = locate(provider) => result,
    }
}

async fn locate(provider: &dyn LocationProvider) -> Result<Coordinates> {
    if !provider.is_enabled().await {
        return Err(AppError::Location(
            "Please enable GPS/Location Services.".to_string(),
        ));
    }

    match provider.current_location().await {
        Ok(Some(fix)) => {
            tracing::debug!("Current location: {}, {}", fix.latitude, fix.longitude);
            return Ok(fix);
        }
        Ok(None) => tracing::warn!("No current location, trying last known location"),
        Err(e) => {
            tracing::error!("Current location request failed: {}", e);
            return Err(AppError::Location("Error retrieving location.".to_string()));
        }
    }

    match provider.last_known_location().await {
        Ok(Some(fix)) => {
            tracing::debug!("Last known location: {}, {}", fix.latitude, fix.longitude);
            Ok(fix)
        }
        Ok(None) => {
            tracing::error!("Both current and last known location are unavailable");
            Err(AppError::Location("Could not retrieve location.".to_string()))
        }
        Err(e) => {
            tracing::error!("Last known location request failed: {}", e);
            Err(AppError::Location("Error getting last location.".to_string()))
        }
    }
}

struct Fix {
    coordinates: Coordinates,
    at: DateTime<Utc>,
}

#[derive(Default)]
struct ReportedState {
    enabled: bool,
    last: Option<Fix>,
}

/// Location as reported by the webview's geolocation API
#[derive(Clone, Default)]
pub struct ReportedLocation {
    state: Arc<RwLock<ReportedState>>,
}

impl ReportedLocation {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ReportedState) -> T) -> T {
        match self.state.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Whether the user granted location access in the webview
    pub fn set_enabled(&self, enabled: bool) {
        self.with_state(|s| s.enabled = enabled);
    }

    pub fn report(&self, coordinates: Coordinates) {
        self.with_state(|s| {
            s.enabled = true;
            s.last = Some(Fix {
                coordinates,
                at: Utc::now(),
            });
        });
    }
}

#[async_trait]
impl LocationProvider for ReportedLocation {
    async fn is_enabled(&self) -> bool {
        self.with_state(|s| s.enabled)
    }

    async fn current_location(&self) -> Result<Option<Coordinates>> {
        let cutoff = Utc::now() - Duration::seconds(CURRENT_FIX_MAX_AGE_SECS);
        Ok(self.with_state(|s| {
            s.last
                .as_ref()
                .filter(|fix| fix.at > cutoff)
                .map(|fix| fix.coordinates)
        }))
    }

    async fn last_known_location(&self) -> Result<Option<Coordinates>> {
        Ok(self.with_state(|s| s.last.as_ref().map(|fix| fix.coordinates)))
    }
}

/// Runs at most one location request at a time for the complaint form
#[derive(Clone)]
pub struct LocationService {
    provider: Arc<dyn LocationProvider>,
    in_flight: Arc<Mutex<InFlight>>,
}

/// The running request, tagged so a finished request only clears itself
#[derive(Default)]
struct InFlight {
    next_id: u64,
    current: Option<(u64, CancellationToken)>,
}

impl LocationService {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self {
            provider,
            in_flight: Arc::new(Mutex::new(InFlight::default())),
        }
    }

    /// Start a request, cancelling any request still running
    pub async fn fetch(&self) -> Result<Coordinates> {
        let token = CancellationToken::new();
        let id = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.next_id += 1;
            let id = in_flight.next_id;
            if let Some((_, previous)) = in_flight.current.replace((id, token.clone())) {
                previous.cancel();
            }
            id
        };

        let result = fetch_location(self.provider.as_ref(), token).await;

        let mut in_flight = self.in_flight.lock().await;
        if matches!(in_flight.current, Some((current, _)) if current == id) {
            in_flight.current = None;
        }
        result
    }

    /// Cancel the running request, if any
    pub async fn cancel(&self) {
        if let Some((_, token)) = self.in_flight.lock().await.current.take() {
            token.cancel();
        }
    }
}
