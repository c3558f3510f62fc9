//! Tauri commands exposed to the frontend
//!
//! This module organizes commands into logical submodules, one per screen
//! group:
//! - `auth`: Login, sign-up, Google sign-in and profile/logout
//! - `complaints`: The complaint form and its submission
//! - `reports`: My reports, the administrator dashboard and report detail
//! - `location`: Device location for the complaint form

pub mod auth;
pub mod complaints;
pub mod location;
pub mod reports;

use crate::error::Result;

// Re-export all commands for convenient registration in main.rs
pub use auth::*;
pub use complaints::*;
pub use location::*;
pub use reports::*;

// ===== General Commands =====

/// Get application information
#[tauri::command]
pub async fn get_app_info() -> Result<AppInfo> {
    Ok(AppInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Application information structure
#[derive(serde::Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}
