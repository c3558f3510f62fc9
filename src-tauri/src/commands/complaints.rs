//! Complaint form commands

use crate::app::AppState;
use crate::error::Result;
use crate::services::{DraftUpdate, FormField, SubmissionState, SubmitSnapshot};
use tauri::State;

#[tauri::command]
pub async fn get_complaint_form(state: State<'_, AppState>) -> Result<SubmitSnapshot> {
    Ok(state.submit_complaint.snapshot().await)
}

#[tauri::command]
pub async fn update_complaint_draft(
    state: State<'_, AppState>,
    update: DraftUpdate,
) -> Result<SubmitSnapshot> {
    state.submit_complaint.update_draft(update).await
}

#[tauri::command]
pub async fn complaint_field_focus_changed(
    state: State<'_, AppState>,
    field: FormField,
    focused: bool,
) -> Result<SubmitSnapshot> {
    Ok(state.submit_complaint.field_focus_changed(field, focused).await)
}

#[tauri::command]
pub async fn submit_complaint(state: State<'_, AppState>) -> Result<SubmissionState> {
    Ok(state.submit_complaint.submit().await)
}

#[tauri::command]
pub async fn reset_submission_state(state: State<'_, AppState>) -> Result<SubmitSnapshot> {
    Ok(state.submit_complaint.reset_submission_state().await)
}
