//! Location commands
//!
//! The webview owns the geolocation API; it reports fixes here and the
//! complaint form asks for the location through `fetch_location`.

use crate::app::AppState;
use crate::error::Result;
use crate::services::{Coordinates, ReportedLocation};
use tauri::State;

#[tauri::command]
pub async fn fetch_location(state: State<'_, AppState>) -> Result<Coordinates> {
    state.location.fetch().await
}

/// Called when the complaint form closes
#[tauri::command]
pub async fn cancel_location_request(state: State<'_, AppState>) -> Result<()> {
    state.location.cancel().await;
    Ok(())
}

#[tauri::command]
pub fn report_device_location(
    location: State<'_, ReportedLocation>,
    latitude: f64,
    longitude: f64,
) -> Result<()> {
    location.report(Coordinates {
        latitude,
        longitude,
    });
    Ok(())
}

#[tauri::command]
pub fn set_location_enabled(location: State<'_, ReportedLocation>, enabled: bool) -> Result<()> {
    tracing::debug!("Location access enabled: {}", enabled);
    location.set_enabled(enabled);
    Ok(())
}
