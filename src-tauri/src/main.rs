// Aranya - Wildlife incident reporting desktop client
// Entry point and application setup

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use aranya::{app, commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aranya=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Aranya application");

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            tracing::info!("Running app setup");
            app::setup(app)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_app_info,
            commands::get_auth_state,
            commands::get_dashboard_route,
            commands::get_current_user,
            commands::get_role,
            commands::sign_up,
            commands::login,
            commands::admin_login,
            commands::begin_google_sign_in,
            commands::sign_in_with_google,
            commands::take_login_message,
            commands::logout,
            commands::get_complaint_form,
            commands::update_complaint_draft,
            commands::complaint_field_focus_changed,
            commands::submit_complaint,
            commands::reset_submission_state,
            commands::refresh_my_reports,
            commands::refresh_all_reports,
            commands::open_report,
            commands::refresh_report,
            commands::update_report_status,
            commands::reset_report_update_state,
            commands::fetch_location,
            commands::cancel_location_request,
            commands::report_device_location,
            commands::set_location_enabled,
        ])
        .run(tauri::generate_context!())?;

    Ok(())
}
