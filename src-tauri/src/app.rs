//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are built here over the shared remote collaborators and
//! made available through AppState.

use crate::auth::IdentityProvider;
use crate::database::{DocumentStore, Repository};
use crate::navigation::Route;
use crate::services::{
    AuthService, ComplaintsService, ListScope, LocationProvider, LocationService,
    ReportDetailService, ReportListService, RoleResolver,
};
use crate::storage::MediaHost;
use std::sync::Arc;

/// Remote collaborators every screen works against
#[derive(Clone)]
pub struct Backends {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn DocumentStore>,
    pub media: Arc<dyn MediaHost>,
    pub location: Arc<dyn LocationProvider>,
}

/// Central application state: one state holder per screen
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub submit_complaint: ComplaintsService,
    pub my_reports: ReportListService,
    pub admin_dashboard: ReportListService,
    pub report_detail: ReportDetailService,
    pub location: LocationService,
}

impl AppState {
    pub fn from_backends(backends: Backends, google_web_client_id: &str) -> Self {
        let repo = Repository::new(backends.store);
        let roles = RoleResolver::new(repo.clone());

        Self {
            auth: AuthService::new(backends.identity.clone(), roles.clone(), google_web_client_id),
            submit_complaint: ComplaintsService::new(
                backends.identity.clone(),
                repo.clone(),
                backends.media,
            ),
            my_reports: ReportListService::new(ListScope::Mine, backends.identity.clone(), repo.clone()),
            admin_dashboard: ReportListService::new(
                ListScope::All,
                backends.identity.clone(),
                repo.clone(),
            ),
            report_detail: ReportDetailService::new(backends.identity, repo, roles),
            location: LocationService::new(backends.location),
        }
    }

    /// Screen to show once the session state is known
    pub async fn initial_route(&self) -> Route {
        self.auth.dashboard_route().await
    }
}

/// Application setup - called once on startup
#[cfg(feature = "desktop")]
pub fn setup(app: &mut tauri::App) -> crate::error::Result<()> {
    use crate::auth::{FirebaseAuth, KeyringSessionStore};
    use crate::config::BackendConfig;
    use crate::database::FirestoreStore;
    use crate::services::ReportedLocation;
    use crate::storage::CloudinaryClient;
    use tauri::Manager;

    tracing::info!("Initializing application");

    let config = BackendConfig::default();
    let client = reqwest::Client::builder()
        .user_agent(concat!("aranya/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let identity = Arc::new(FirebaseAuth::new(
        client.clone(),
        config.clone(),
        Arc::new(KeyringSessionStore),
    ));
    let store = Arc::new(FirestoreStore::new(client.clone(), config.clone(), identity.clone()));
    let media = Arc::new(CloudinaryClient::new(client, config.clone()));
    let reported_location = ReportedLocation::new();

    let state = AppState::from_backends(
        Backends {
            identity,
            store,
            media,
            location: Arc::new(reported_location.clone()),
        },
        &config.google_web_client_id,
    );

    // Resolve the session and role before the first screen renders
    let initial = tauri::async_runtime::block_on(state.auth.initialize());
    tracing::info!("Initial session state: {:?}", initial);

    app.manage(state);
    app.manage(reported_location);

    tracing::info!("Application initialized successfully");

    Ok(())
}
