//! Integration tests for Aranya
//!
//! These tests drive the per-screen state holders end to end:
//! - Sign-in and role resolution
//! - Complaint submission with sequential uploads
//! - Report listing and administrator status updates

use aranya::app::{AppState, Backends};
use aranya::auth::{AuthUser, IdentityProvider};
use aranya::config::{COMPLAINTS_COLLECTION, USERS_COLLECTION};
use aranya::database::{DocumentStore, FileType, MemoryStore};
use aranya::error::{AppError, Result};
use aranya::navigation::Route;
use aranya::services::{
    AuthState, DraftUpdate, ReportDetailState, ReportListState, ReportedLocation, Role,
    SubmissionState, UpdateReportState,
};
use aranya::storage::{MediaHost, UploadRequest, UploadedAsset};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Identity provider with a fixed set of email/password accounts
struct ScriptedIdentity {
    accounts: HashMap<String, (String, String)>,
    current: Mutex<Option<AuthUser>>,
}

impl ScriptedIdentity {
    fn new(accounts: &[(&str, &str, &str)]) -> Self {
        Self {
            accounts: accounts
                .iter()
                .map(|(email, uid, password)| {
                    (email.to_string(), (uid.to_string(), password.to_string()))
                })
                .collect(),
            current: Mutex::new(None),
        }
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    async fn sign_up(&self, _email: &str, _password: &str) -> Result<AuthUser> {
        Err(AppError::Auth("Sign-up is closed.".to_string()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        match self.accounts.get(email) {
            Some((uid, expected)) if expected == password => {
                let user = AuthUser {
                    uid: uid.clone(),
                    email: Some(email.to_string()),
                    display_name: None,
                };
                *self.current.lock().unwrap() = Some(user.clone());
                Ok(user)
            }
            _ => Err(AppError::Auth("Invalid email or password.".to_string())),
        }
    }

    async fn sign_in_with_google(&self, _id_token: &str) -> Result<AuthUser> {
        Err(AppError::Auth("Google Sign-In failed.".to_string()))
    }

    async fn restore_session(&self) -> Result<Option<AuthUser>> {
        Ok(None)
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.current.lock().unwrap().clone()
    }

    async fn sign_out(&self) -> Result<()> {
        *self.current.lock().unwrap() = None;
        Ok(())
    }
}

/// Media host that reads each file and records the upload order
#[derive(Default)]
struct RecordingHost {
    uploaded: Mutex<Vec<String>>,
    fail_at: Option<usize>,
}

impl RecordingHost {
    fn uploads(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaHost for RecordingHost {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadedAsset> {
        let bytes = tokio::fs::read(&request.file.path).await?;

        let n = {
            let mut uploaded = self.uploaded.lock().unwrap();
            uploaded.push(request.file.locator.clone());
            uploaded.len()
        };
        if self.fail_at == Some(n) {
            return Err(AppError::Remote {
                service: "Media host",
                status: 502,
                message: "Bad gateway".to_string(),
            });
        }

        Ok(UploadedAsset {
            public_id: format!("aranya/{}", n),
            version: Some("1".to_string()),
            resource_type: Some(request.resource_type.to_string()),
            secure_url: format!("https://media.example/{}", request.file.original_filename),
            format: request.file.path.extension().map(|e| e.to_string_lossy().into_owned()),
            bytes: bytes.len() as u64,
            ..UploadedAsset::default()
        })
    }
}

struct TestApp {
    state: AppState,
    store: MemoryStore,
    host: Arc<RecordingHost>,
    files: TempDir,
}

impl TestApp {
    async fn new(fail_at: Option<usize>) -> Self {
        let store = MemoryStore::new();
        store
            .insert(
                USERS_COLLECTION,
                "admin-uid",
                json!({ "email": "warden@aranya.org", "isAdminRole": true })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await;
        store
            .insert(
                USERS_COLLECTION,
                "ranger-uid",
                json!({ "email": "ranger@aranya.org", "isAdminRole": false })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await;

        let identity = Arc::new(ScriptedIdentity::new(&[
            ("warden@aranya.org", "admin-uid", "warden-pass"),
            ("ranger@aranya.org", "ranger-uid", "ranger-pass"),
            // No profile document
            ("visitor@aranya.org", "visitor-uid", "visitor-pass"),
        ]));
        let host = Arc::new(RecordingHost {
            fail_at,
            ..RecordingHost::default()
        });

        let state = AppState::from_backends(
            Backends {
                identity,
                store: Arc::new(store.clone()),
                media: host.clone(),
                location: Arc::new(ReportedLocation::new()),
            },
            "web-client.apps.googleusercontent.com",
        );

        Self {
            state,
            store,
            host,
            files: TempDir::new().unwrap(),
        }
    }

    fn file(&self, name: &str, contents: &[u8]) -> String {
        let path: PathBuf = self.files.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    async fn sign_in(&self, email: &str, password: &str) {
        let state = self.state.auth.login(email, password).await;
        assert!(matches!(state, AuthState::Authenticated { .. }), "{:?}", state);
    }

    async fn edit(&self, update: DraftUpdate) {
        self.state.submit_complaint.update_draft(update).await.unwrap();
    }

    async fn fill_deer_report(&self) {
        self.edit(DraftUpdate::Title("Injured deer near trail 3".to_string())).await;
        self.edit(DraftUpdate::Description("Found limping deer".to_string())).await;
    }

    async fn submit_deer_report(&self) -> String {
        self.sign_in("ranger@aranya.org", "ranger-pass").await;
        self.fill_deer_report().await;
        match self.state.submit_complaint.submit().await {
            SubmissionState::Success { complaint_id } => complaint_id,
            other => panic!("submission failed: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_injured_deer_report_with_two_photos() {
    let app = TestApp::new(None).await;
    app.sign_in("ranger@aranya.org", "ranger-pass").await;
    assert_eq!(app.state.initial_route().await, Route::Home);

    let first = app.file("deer_1.jpg", b"jpeg-bytes-1");
    let second = app.file("deer_2.jpg", b"jpeg-bytes-22");
    app.fill_deer_report().await;
    app.edit(DraftUpdate::AddMedia(vec![first.clone(), second.clone()])).await;

    let state = app.state.submit_complaint.submit().await;

    let SubmissionState::Success { complaint_id } = state else {
        panic!("expected success, got {:?}", state);
    };
    assert_eq!(app.host.uploads(), vec![first, second]);
    assert_eq!(app.store.count(COMPLAINTS_COLLECTION).await, 1);

    let doc = app
        .store
        .get(COMPLAINTS_COLLECTION, &complaint_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(doc.fields["status"], "Pending");
    assert_eq!(doc.fields["userId"], "ranger-uid");
    assert_eq!(doc.fields["attachedFiles"].as_array().unwrap().len(), 2);
    assert!(!doc.fields.contains_key("stagedMedia"));
    assert!(!doc.fields.contains_key("stagedDocuments"));

    // Form is cleared for the next report
    let snapshot = app.state.submit_complaint.snapshot().await;
    assert!(snapshot.draft.complaint.title.is_empty());
    assert!(snapshot.draft.staged_media.is_empty());

    let ReportListState::Success { reports } = app.state.my_reports.refresh().await else {
        panic!("expected the new report in my reports");
    };
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].id, complaint_id);
    assert_eq!(reports[0].title, "Injured deer near trail 3");
    assert_eq!(reports[0].attached_files[0].file_type, FileType::Image);
    assert_eq!(reports[0].attached_files[1].original_filename, "deer_2.jpg");
    assert_eq!(reports[0].attached_files[1].bytes, 13);
}

#[tokio::test]
async fn test_admin_resolves_report() {
    let app = TestApp::new(None).await;
    let id = app.submit_deer_report().await;
    let before = app.store.get(COMPLAINTS_COLLECTION, &id).await.unwrap().unwrap();
    app.state.auth.logout().await;

    let state = app
        .state
        .auth
        .admin_login("warden@aranya.org", "warden-pass")
        .await;
    assert!(matches!(state, AuthState::Authenticated { .. }));
    assert_eq!(app.state.initial_route().await, Route::AdminDashboard);

    let ReportListState::Success { reports } = app.state.admin_dashboard.refresh().await else {
        panic!("expected reports on the dashboard");
    };
    assert_eq!(reports[0].status, "Pending");

    let detail = app.state.report_detail.open(&id).await;
    assert!(detail.is_admin);
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let detail = app
        .state
        .report_detail
        .update_status_and_remarks("Resolved", "Ranger dispatched")
        .await;

    assert_eq!(detail.update_state, UpdateReportState::Success);
    let ReportDetailState::Success { report } = detail.state else {
        panic!("expected refreshed report");
    };
    assert_eq!(report.status, "Resolved");
    assert_eq!(report.admin_remarks, "Ranger dispatched");
    assert_eq!(report.last_updated_by_admin_uid.as_deref(), Some("admin-uid"));

    let after = app.store.get(COMPLAINTS_COLLECTION, &id).await.unwrap().unwrap();
    for (field, value) in &before.fields {
        if ["status", "adminRemarks", "lastUpdatedByAdminUid", "lastStatusUpdateTimestamp"]
            .contains(&field.as_str())
        {
            continue;
        }
        assert_eq!(after.fields.get(field), Some(value), "field {} changed", field);
    }
    let before_update = before.fields["lastStatusUpdateTimestamp"].as_str().unwrap();
    let after_update = after.fields["lastStatusUpdateTimestamp"].as_str().unwrap();
    assert!(
        chrono::DateTime::parse_from_rfc3339(after_update).unwrap()
            > chrono::DateTime::parse_from_rfc3339(before_update).unwrap()
    );
}

#[tokio::test]
async fn test_regular_user_cannot_update_status() {
    let app = TestApp::new(None).await;
    let id = app.submit_deer_report().await;
    let writes = app.store.write_count();

    app.state.report_detail.open(&id).await;
    let detail = app
        .state
        .report_detail
        .update_status_and_remarks("Resolved", "Closing my own report")
        .await;

    assert_eq!(
        detail.update_state,
        UpdateReportState::Error {
            message: "Unauthorized: This action requires admin privileges.".to_string()
        }
    );
    assert_eq!(app.store.write_count(), writes);
    let doc = app.store.get(COMPLAINTS_COLLECTION, &id).await.unwrap().unwrap();
    assert_eq!(doc.fields["status"], "Pending");
}

#[tokio::test]
async fn test_non_admin_admin_login_is_denied() {
    let app = TestApp::new(None).await;

    let state = app
        .state
        .auth
        .admin_login("ranger@aranya.org", "ranger-pass")
        .await;

    assert_eq!(
        state,
        AuthState::Error {
            message: "Access Denied: Not an authorized administrator.".to_string()
        }
    );
    assert!(app.state.auth.current_user().is_none());
    assert_eq!(app.state.initial_route().await, Route::Login);
}

#[tokio::test]
async fn test_blank_complaint_makes_no_remote_calls() {
    let app = TestApp::new(None).await;
    app.sign_in("ranger@aranya.org", "ranger-pass").await;
    let photo = app.file("deer.jpg", b"jpeg");
    app.edit(DraftUpdate::AddMedia(vec![photo])).await;
    app.edit(DraftUpdate::Description("Found limping deer".to_string())).await;

    let state = app.state.submit_complaint.submit().await;

    assert_eq!(
        state,
        SubmissionState::Error {
            message: "Please correct the errors noted above.".to_string()
        }
    );
    assert!(app.host.uploads().is_empty());
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn test_complaint_without_files_skips_uploads() {
    let app = TestApp::new(None).await;

    let id = app.submit_deer_report().await;

    assert!(app.host.uploads().is_empty());
    let doc = app.store.get(COMPLAINTS_COLLECTION, &id).await.unwrap().unwrap();
    assert_eq!(doc.fields["attachedFiles"], json!([]));
}

#[tokio::test]
async fn test_failed_upload_writes_nothing_and_keeps_draft() {
    let app = TestApp::new(Some(2)).await;
    app.sign_in("ranger@aranya.org", "ranger-pass").await;
    let photo = app.file("deer.jpg", b"jpeg");
    let clip = app.file("deer.mp4", b"mp4");
    let permit = app.file("permit.pdf", b"%PDF");
    app.fill_deer_report().await;
    app.edit(DraftUpdate::AddMedia(vec![photo.clone(), clip.clone()])).await;
    app.edit(DraftUpdate::AddDocuments(vec![permit.clone()])).await;

    let state = app.state.submit_complaint.submit().await;

    assert_eq!(
        state,
        SubmissionState::Error {
            message: format!("File upload failed for '{}'. Please try again.", clip)
        }
    );
    assert_eq!(app.host.uploads(), vec![photo.clone(), clip.clone()]);
    assert_eq!(app.store.write_count(), 0);

    let draft = app.state.submit_complaint.snapshot().await.draft;
    assert_eq!(draft.complaint.title, "Injured deer near trail 3");
    assert_eq!(draft.staged_media, vec![photo, clip]);
    assert_eq!(draft.staged_documents, vec![permit]);
}

#[tokio::test]
async fn test_user_without_profile_is_regular_user() {
    let app = TestApp::new(None).await;

    app.sign_in("visitor@aranya.org", "visitor-pass").await;

    assert_eq!(app.state.auth.role().await, Role::RegularUser);
    assert_eq!(app.state.initial_route().await, Route::Home);
    assert_eq!(
        app.state.auth.take_login_message().await.as_deref(),
        Some("Logged in successfully as visitor@aranya.org!")
    );
}

#[tokio::test]
async fn test_my_reports_after_logout() {
    let app = TestApp::new(None).await;
    app.submit_deer_report().await;

    app.state.auth.logout().await;

    assert_eq!(
        app.state.my_reports.refresh().await,
        ReportListState::Error {
            message: "User not authenticated. Please log in.".to_string()
        }
    );
}
