//! Application configuration constants
//!
//! Central location for the compiled-in backend endpoints, collection names,
//! attachment limits and the status vocabulary used throughout the application.

// ===== Identity Provider =====

/// Firebase web API key used for every identity toolkit request.
/// Baked in at build time; an empty key fails every sign-in attempt.
pub const FIREBASE_API_KEY: &str = match option_env!("ARANYA_FIREBASE_API_KEY") {
    Some(key) => key,
    None => "",
};

/// Firebase project hosting the `users` and `complaints` collections
pub const FIREBASE_PROJECT_ID: &str = match option_env!("ARANYA_FIREBASE_PROJECT_ID") {
    Some(project) => project,
    None => "aranya",
};

/// OAuth web client id the frontend uses to obtain a Google ID token
pub const GOOGLE_WEB_CLIENT_ID: &str =
    "229648396736-bn4evm6vp2auje0q3cl18pcrefi0jll5.apps.googleusercontent.com";

pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

// ===== Document Store =====

pub const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

pub const USERS_COLLECTION: &str = "users";
pub const COMPLAINTS_COLLECTION: &str = "complaints";

// ===== Media Host =====

pub const CLOUDINARY_URL: &str = "https://api.cloudinary.com/v1_1";
pub const CLOUDINARY_CLOUD_NAME: &str = "dgaj2x74q";

/// Unsigned upload preset configured on the Cloudinary account
pub const CLOUDINARY_UPLOAD_PRESET: &str = "aaryana";

// ===== Attachments =====

/// Maximum number of photos/videos staged on one complaint
pub const MAX_MEDIA_ATTACHMENTS: usize = 5;

/// Document media types accepted by the document picker
pub const ACCEPTED_DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
];

// ===== Complaint Status =====

/// Status every new complaint starts in
pub const DEFAULT_COMPLAINT_STATUS: &str = "Pending";

/// Statuses an administrator may assign
pub const ADMIN_COMPLAINT_STATUSES: &[&str] = &[
    "Pending",
    "In Progress",
    "Needs More Info",
    "Resolved",
    "Rejected",
];

// ===== Display =====

/// chrono format for incident and submission times ("05 Mar 2025, 02:30 PM")
pub const DISPLAY_DATE_TIME_FORMAT: &str = "%d %b %Y, %I:%M %p";

/// Remote endpoints used by the identity, document and media clients.
///
/// Defaults to the compiled-in constants above; only tests construct it
/// with other values.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_key: String,
    pub project_id: String,
    pub google_web_client_id: String,
    pub identity_toolkit_url: String,
    pub secure_token_url: String,
    pub firestore_url: String,
    pub cloudinary_url: String,
    pub cloud_name: String,
    pub upload_preset: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: FIREBASE_API_KEY.to_string(),
            project_id: FIREBASE_PROJECT_ID.to_string(),
            google_web_client_id: GOOGLE_WEB_CLIENT_ID.to_string(),
            identity_toolkit_url: IDENTITY_TOOLKIT_URL.to_string(),
            secure_token_url: SECURE_TOKEN_URL.to_string(),
            firestore_url: FIRESTORE_URL.to_string(),
            cloudinary_url: CLOUDINARY_URL.to_string(),
            cloud_name: CLOUDINARY_CLOUD_NAME.to_string(),
            upload_preset: CLOUDINARY_UPLOAD_PRESET.to_string(),
        }
    }
}

impl BackendConfig {
    /// Root of the default database's document tree
    pub fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.firestore_url.trim_end_matches('/'),
            self.project_id
        )
    }

    /// Resource name of a document, as Firestore expects it in write requests
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!(
            "projects/{}/databases/(default)/documents/{}/{}",
            self.project_id, collection, id
        )
    }

    /// Unsigned upload endpoint for a Cloudinary resource type
    pub fn upload_url(&self, resource_type: &str) -> String {
        format!(
            "{}/{}/{}/upload",
            self.cloudinary_url.trim_end_matches('/'),
            self.cloud_name,
            resource_type
        )
    }
}
