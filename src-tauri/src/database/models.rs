//! Document models
//!
//! Rust structs for the documents kept in the remote store.
//! Field names follow the store's camelCase convention; closed enumerations
//! are stored by their upper-case name.

use crate::config::{DEFAULT_COMPLAINT_STATUS, DISPLAY_DATE_TIME_FORMAT};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Kind of wildlife incident being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintCategory {
    Poaching,
    InjuredAnimal,
    IllegalLogging,
    HabitatDestruction,
    IllegalFishing,
    Pollution,
    Encroachment,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// How the reporter wants to be contacted about the complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactPreference {
    Email,
    Phone,
    #[default]
    Anonymous,
}

/// Coarse classification of an uploaded file, decided from its media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileType {
    Image,
    Video,
    Document,
    #[default]
    Raw,
}

/// Metadata the media host returned for one uploaded file.
///
/// Only ever built from a successful upload and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileReference {
    pub public_id: String,
    pub version: Option<String>,
    pub signature: Option<String>,
    /// Host resource type: "image", "video" or "raw"
    pub resource_type: String,
    pub secure_url: String,
    pub original_filename: String,
    pub format: String,
    pub bytes: u64,
    pub file_type: FileType,
}

/// A submitted wildlife complaint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplaintData {
    /// Document id; taken from the store, never written as a field
    pub id: String,
    pub user_id: String,

    pub title: String,
    pub description: String,
    /// Milliseconds since epoch at UTC midnight of the incident day
    pub incident_date: Option<i64>,
    /// Milliseconds from epoch start giving the time of day
    pub incident_time: Option<i64>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub landmark: String,

    pub category: Option<ComplaintCategory>,
    pub species_involved: String,
    pub severity: Option<SeverityLevel>,

    pub attached_files: Vec<FileReference>,

    pub witness_name: String,
    pub witness_contact: String,

    pub contact_preference: ContactPreference,
    pub additional_notes: String,

    pub status: String,
    pub admin_remarks: String,
    pub last_updated_by_admin_uid: Option<String>,
    pub last_status_update_timestamp: Option<DateTime<Utc>>,

    pub submission_timestamp: Option<DateTime<Utc>>,
    pub client_submission_timestamp: i64,
}

impl Default for ComplaintData {
    fn default() -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            title: String::new(),
            description: String::new(),
            incident_date: None,
            incident_time: None,
            latitude: None,
            longitude: None,
            landmark: String::new(),
            category: None,
            species_involved: String::new(),
            severity: None,
            attached_files: Vec::new(),
            witness_name: String::new(),
            witness_contact: String::new(),
            contact_preference: ContactPreference::Anonymous,
            additional_notes: String::new(),
            status: DEFAULT_COMPLAINT_STATUS.to_string(),
            admin_remarks: String::new(),
            last_updated_by_admin_uid: None,
            last_status_update_timestamp: None,
            submission_timestamp: None,
            client_submission_timestamp: 0,
        }
    }
}

impl ComplaintData {
    /// Incident day and time of day combined for display.
    ///
    /// The date and the time are kept apart in storage; the hour and minute
    /// of `incident_time` are applied to the UTC day of `incident_date`.
    pub fn formatted_incident_date_time(&self) -> String {
        let Some(date_ms) = self.incident_date else {
            return "Date Not Set".to_string();
        };
        let Some(day) = DateTime::<Utc>::from_timestamp_millis(date_ms).map(|d| d.date_naive())
        else {
            return "Invalid Date/Time".to_string();
        };

        let (hour, minute) = match self.incident_time {
            Some(time_ms) => match DateTime::<Utc>::from_timestamp_millis(time_ms) {
                Some(time) => (time.hour(), time.minute()),
                None => return "Invalid Date/Time".to_string(),
            },
            None => (0, 0),
        };

        match day.and_hms_opt(hour, minute, 0) {
            Some(combined) => combined.format(DISPLAY_DATE_TIME_FORMAT).to_string(),
            None => "Invalid Date/Time".to_string(),
        }
    }

    /// Server submission time for list rows
    pub fn formatted_submission_time(&self) -> String {
        self.submission_timestamp
            .map(|ts| ts.format(DISPLAY_DATE_TIME_FORMAT).to_string())
            .unwrap_or_else(|| "Date N/A".to_string())
    }
}

/// The complaint form being filled in, plus the local files staged for upload.
///
/// The staging lists exist only here; [`ComplaintData`] has no field for
/// them, so a persisted complaint can never carry a device file locator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplaintDraft {
    #[serde(flatten)]
    pub complaint: ComplaintData,
    /// Photos and videos, in the order they were picked
    pub staged_media: Vec<String>,
    pub staged_documents: Vec<String>,
}

impl ComplaintDraft {
    /// Every staged locator, media first, in upload order
    pub fn staged_files(&self) -> Vec<String> {
        self.staged_media
            .iter()
            .chain(self.staged_documents.iter())
            .cloned()
            .collect()
    }
}

/// Profile document keyed by user id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub email: Option<String>,
    pub is_admin_role: Option<bool>,
}
