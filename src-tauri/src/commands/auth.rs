//! Session commands
//!
//! Login, sign-up and profile screens.

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::error::Result;
use crate::navigation::Route;
use crate::services::{AuthState, Role};
use tauri::State;

#[tauri::command]
pub async fn get_auth_state(state: State<'_, AppState>) -> Result<AuthState> {
    Ok(state.auth.state().await)
}

/// Screen to open after startup or after a successful sign-in
#[tauri::command]
pub async fn get_dashboard_route(state: State<'_, AppState>) -> Result<Route> {
    Ok(state.initial_route().await)
}

#[tauri::command]
pub async fn get_current_user(state: State<'_, AppState>) -> Result<Option<AuthUser>> {
    Ok(state.auth.current_user())
}

#[tauri::command]
pub async fn get_role(state: State<'_, AppState>) -> Result<Role> {
    Ok(state.auth.role().await)
}

#[tauri::command]
pub async fn sign_up(
    state: State<'_, AppState>,
    email: String,
    password: String,
) -> Result<AuthState> {
    Ok(state.auth.sign_up(&email, &password).await)
}

#[tauri::command]
pub async fn login(state: State<'_, AppState>, email: String, password: String) -> Result<AuthState> {
    Ok(state.auth.login(&email, &password).await)
}

#[tauri::command]
pub async fn admin_login(
    state: State<'_, AppState>,
    email: String,
    password: String,
) -> Result<AuthState> {
    Ok(state.auth.admin_login(&email, &password).await)
}

/// Returns the Google web client id to start the sign-in flow with
#[tauri::command]
pub async fn begin_google_sign_in(state: State<'_, AppState>) -> Result<String> {
    state.auth.begin_google_sign_in().await
}

#[tauri::command]
pub async fn sign_in_with_google(
    state: State<'_, AppState>,
    id_token: Option<String>,
) -> Result<AuthState> {
    Ok(state.auth.sign_in_with_google(id_token.as_deref()).await)
}

/// One-shot greeting after sign-in
#[tauri::command]
pub async fn take_login_message(state: State<'_, AppState>) -> Result<Option<String>> {
    Ok(state.auth.take_login_message().await)
}

#[tauri::command]
pub async fn logout(state: State<'_, AppState>) -> Result<AuthState> {
    state.location.cancel().await;
    Ok(state.auth.logout().await)
}
