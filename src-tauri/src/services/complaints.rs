//! Complaint submission
//!
//! Holds the complaint form, the files staged on it and the submission
//! state. Submitting uploads every staged file in order and only then
//! writes the complaint document; a failed upload stops the submission
//! before anything is written and leaves the form untouched.

use crate::auth::IdentityProvider;
use crate::config::{ACCEPTED_DOCUMENT_TYPES, MAX_MEDIA_ATTACHMENTS};
use crate::database::{
    ComplaintCategory, ComplaintData, ComplaintDraft, ContactPreference, FileReference,
    Repository, SeverityLevel,
};
use crate::error::{AppError, Result};
use crate::storage::{MediaHost, StagedFile, UploadRequest};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

const TITLE_REQUIRED: &str = "Title cannot be empty.";
const DESCRIPTION_REQUIRED: &str = "Description cannot be empty.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmissionState {
    Idle,
    Loading,
    #[serde(rename_all = "camelCase")]
    Success { complaint_id: String },
    Error { message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrors {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Required form fields with inline validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Title,
    Description,
}

/// One edit to the complaint form
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum DraftUpdate {
    Title(String),
    Description(String),
    IncidentDateTime {
        date: Option<i64>,
        time: Option<i64>,
    },
    Location {
        latitude: Option<f64>,
        longitude: Option<f64>,
        landmark: String,
    },
    Category(Option<ComplaintCategory>),
    Species(String),
    Severity(Option<SeverityLevel>),
    WitnessName(String),
    WitnessContact(String),
    ContactPreference(ContactPreference),
    AdditionalNotes(String),
    AddMedia(Vec<String>),
    RemoveMedia(String),
    AddDocuments(Vec<String>),
    RemoveDocument(String),
}

/// Everything the submit screen renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSnapshot {
    pub draft: ComplaintDraft,
    pub state: SubmissionState,
    pub field_errors: FieldErrors,
}

#[derive(Default)]
struct Touched {
    title: bool,
    description: bool,
}

struct Form {
    draft: ComplaintDraft,
    state: SubmissionState,
    field_errors: FieldErrors,
    touched: Touched,
}

impl Form {
    fn snapshot(&self) -> SubmitSnapshot {
        SubmitSnapshot {
            draft: self.draft.clone(),
            state: self.state.clone(),
            field_errors: self.field_errors.clone(),
        }
    }

    fn validate_title(&mut self) -> bool {
        let valid = !self.draft.complaint.title.trim().is_empty();
        self.field_errors.title = (!valid).then(|| TITLE_REQUIRED.to_string());
        valid
    }

    fn validate_description(&mut self) -> bool {
        let valid = !self.draft.complaint.description.trim().is_empty();
        self.field_errors.description = (!valid).then(|| DESCRIPTION_REQUIRED.to_string());
        valid
    }

    fn validate_all(&mut self) -> bool {
        self.touched.title = true;
        self.touched.description = true;
        let title_ok = self.validate_title();
        let description_ok = self.validate_description();
        title_ok && description_ok
    }

    fn apply(&mut self, update: DraftUpdate) -> Result<()> {
        let complaint = &mut self.draft.complaint;
        match update {
            DraftUpdate::Title(title) => {
                complaint.title = title;
                if self.touched.title {
                    self.validate_title();
                }
            }
            DraftUpdate::Description(description) => {
                complaint.description = description;
                if self.touched.description {
                    self.validate_description();
                }
            }
            DraftUpdate::IncidentDateTime { date, time } => {
                complaint.incident_date = date;
                complaint.incident_time = time;
            }
            DraftUpdate::Location {
                latitude,
                longitude,
                landmark,
            } => {
                complaint.latitude = latitude;
                complaint.longitude = longitude;
                complaint.landmark = landmark;
            }
            DraftUpdate::Category(category) => complaint.category = category,
            DraftUpdate::Species(species) => complaint.species_involved = species,
            DraftUpdate::Severity(severity) => complaint.severity = severity,
            DraftUpdate::WitnessName(name) => complaint.witness_name = name,
            DraftUpdate::WitnessContact(contact) => complaint.witness_contact = contact,
            DraftUpdate::ContactPreference(preference) => {
                complaint.contact_preference = preference
            }
            DraftUpdate::AdditionalNotes(notes) => complaint.additional_notes = notes,
            DraftUpdate::AddMedia(locators) => {
                if self.draft.staged_media.len() + locators.len() > MAX_MEDIA_ATTACHMENTS {
                    return Err(AppError::Validation(format!(
                        "You can attach up to {} photos or videos.",
                        MAX_MEDIA_ATTACHMENTS
                    )));
                }
                for locator in &locators {
                    let mime = StagedFile::from_locator(locator).mime_type;
                    if !(mime.starts_with("image/") || mime.starts_with("video/")) {
                        return Err(AppError::Validation(format!(
                            "'{}' is not a photo or video.",
                            locator
                        )));
                    }
                }
                self.draft.staged_media.extend(locators);
            }
            DraftUpdate::RemoveMedia(locator) => {
                self.draft.staged_media.retain(|l| *l != locator);
            }
            DraftUpdate::AddDocuments(locators) => {
                for locator in &locators {
                    let mime = StagedFile::from_locator(locator).mime_type;
                    if !ACCEPTED_DOCUMENT_TYPES.contains(&mime.as_str()) {
                        return Err(AppError::Validation(format!(
                            "'{}' is not a supported document type.",
                            locator
                        )));
                    }
                }
                self.draft.staged_documents.extend(locators);
            }
            DraftUpdate::RemoveDocument(locator) => {
                self.draft.staged_documents.retain(|l| *l != locator);
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ComplaintsService {
    identity: Arc<dyn IdentityProvider>,
    repo: Repository,
    media: Arc<dyn MediaHost>,
    form: Arc<RwLock<Form>>,
}

impl ComplaintsService {
    pub fn new(identity: Arc<dyn IdentityProvider>, repo: Repository, media: Arc<dyn MediaHost>) -> Self {
        Self {
            identity,
            repo,
            media,
            form: Arc::new(RwLock::new(Form {
                draft: ComplaintDraft::default(),
                state: SubmissionState::Idle,
                field_errors: FieldErrors::default(),
                touched: Touched::default(),
            })),
        }
    }

    pub async fn snapshot(&self) -> SubmitSnapshot {
        self.form.read().await.snapshot()
    }

    /// Apply one form edit. A rejected edit leaves the form unchanged.
    pub async fn update_draft(&self, update: DraftUpdate) -> Result<SubmitSnapshot> {
        let mut form = self.form.write().await;
        if form.state == SubmissionState::Loading {
            return Err(AppError::Validation(
                "The form cannot be edited while it is being submitted.".to_string(),
            ));
        }
        form.apply(update)?;
        Ok(form.snapshot())
    }

    /// Track focus on a required field: leaving it the first time shows its
    /// error, entering it hides the error.
    pub async fn field_focus_changed(&self, field: FormField, focused: bool) -> SubmitSnapshot {
        let mut form = self.form.write().await;
        match (field, focused) {
            (FormField::Title, true) => form.field_errors.title = None,
            (FormField::Description, true) => form.field_errors.description = None,
            (FormField::Title, false) if !form.touched.title => {
                form.touched.title = true;
                form.validate_title();
            }
            (FormField::Description, false) if !form.touched.description => {
                form.touched.description = true;
                form.validate_description();
            }
            _ => {}
        }
        form.snapshot()
    }

    /// Submit the current form.
    ///
    /// A call made while another submission is still running changes
    /// nothing and reports the running submission's `Loading` state.
    pub async fn submit(&self) -> SubmissionState {
        let draft = {
            let mut form = self.form.write().await;
            if form.state == SubmissionState::Loading {
                tracing::warn!("Submission already in progress, ignoring");
                return SubmissionState::Loading;
            }

            if !form.validate_all() {
                form.state = SubmissionState::Error {
                    message: "Please correct the errors noted above.".to_string(),
                };
                return form.state.clone();
            }

            form.state = SubmissionState::Loading;
            form.draft.clone()
        };

        let result = self.upload_and_store(draft).await;

        let mut form = self.form.write().await;
        form.state = match result {
            Ok(complaint_id) => {
                form.draft = ComplaintDraft::default();
                SubmissionState::Success { complaint_id }
            }
            Err(e) => {
                tracing::error!("Complaint submission failed: {}", e);
                SubmissionState::Error {
                    message: e.to_string(),
                }
            }
        };
        form.state.clone()
    }

    async fn upload_and_store(&self, draft: ComplaintDraft) -> Result<String> {
        let user = self.identity.current_user().ok_or_else(|| {
            AppError::Auth("User not authenticated. Please log in again.".to_string())
        })?;

        let locators = draft.staged_files();
        if locators.is_empty() {
            tracing::info!("No files attached, saving complaint only");
        } else {
            tracing::info!("Uploading {} files before saving complaint", locators.len());
        }

        let mut attached_files: Vec<FileReference> = Vec::with_capacity(locators.len());
        for locator in &locators {
            let request = UploadRequest::new(StagedFile::from_locator(locator));
            match self.media.upload(&request).await {
                Ok(asset) => attached_files.push(request.file_reference(asset)),
                Err(e) => {
                    tracing::error!("Upload of '{}' failed, aborting submission: {}", locator, e);
                    return Err(AppError::Upload(locator.clone()));
                }
            }
        }

        // TODO: delete already uploaded files from the media host when this write fails
        let complaint = ComplaintData {
            id: String::new(),
            user_id: user.uid,
            attached_files,
            client_submission_timestamp: Utc::now().timestamp_millis(),
            ..draft.complaint
        };

        let id = self.repo.create_complaint(&complaint).await?;
        tracing::info!(
            "Complaint {} submitted with {} file references",
            id,
            complaint.attached_files.len()
        );
        Ok(id)
    }

    /// Back to `Idle`, clearing inline field errors. Has no effect while a
    /// submission is running.
    pub async fn reset_submission_state(&self) -> SubmitSnapshot {
        let mut form = self.form.write().await;
        if form.state == SubmissionState::Loading {
            return form.snapshot();
        }
        form.state = SubmissionState::Idle;
        form.field_errors = FieldErrors::default();
        form.touched = Touched::default();
        form.snapshot()
    }
}
