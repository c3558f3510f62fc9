//! Report commands
//!
//! My reports, the administrator dashboard and the report detail screen.

use crate::app::AppState;
use crate::error::Result;
use crate::services::{ReportDetailSnapshot, ReportListState};
use tauri::State;

/// Reload the signed-in user's reports
#[tauri::command]
pub async fn refresh_my_reports(state: State<'_, AppState>) -> Result<ReportListState> {
    Ok(state.my_reports.refresh().await)
}

/// Reload every report for the administrator dashboard
#[tauri::command]
pub async fn refresh_all_reports(state: State<'_, AppState>) -> Result<ReportListState> {
    Ok(state.admin_dashboard.refresh().await)
}

#[tauri::command]
pub async fn open_report(
    state: State<'_, AppState>,
    report_id: String,
) -> Result<ReportDetailSnapshot> {
    Ok(state.report_detail.open(&report_id).await)
}

#[tauri::command]
pub async fn refresh_report(state: State<'_, AppState>) -> Result<ReportDetailSnapshot> {
    Ok(state.report_detail.refresh().await)
}

#[tauri::command]
pub async fn update_report_status(
    state: State<'_, AppState>,
    status: String,
    remarks: String,
) -> Result<ReportDetailSnapshot> {
    Ok(state
        .report_detail
        .update_status_and_remarks(&status, &remarks)
        .await)
}

#[tauri::command]
pub async fn reset_report_update_state(
    state: State<'_, AppState>,
) -> Result<ReportDetailSnapshot> {
    Ok(state.report_detail.reset_update_state().await)
}
