//! Storage module
//!
//! Binary files never go to the document store. They are uploaded to a
//! remote media host, and only the metadata it returns is persisted with a
//! complaint as a [`FileReference`].

pub mod cloudinary;

pub use cloudinary::CloudinaryClient;

use crate::database::{FileReference, FileType};
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// A local file the user picked, not yet uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Locator exactly as it was staged; used in error messages
    pub locator: String,
    pub path: PathBuf,
    pub original_filename: String,
    pub mime_type: String,
}

impl StagedFile {
    /// Resolve a staged locator (plain path or `file://` URI)
    pub fn from_locator(locator: &str) -> Self {
        let path = PathBuf::from(locator.strip_prefix("file://").unwrap_or(locator));

        let original_filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| locator.to_string());

        let mime_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            locator: locator.to_string(),
            path,
            original_filename,
            mime_type,
        }
    }
}

/// Host resource type and app file category for a media type
pub fn classify(mime_type: &str) -> (&'static str, FileType) {
    if mime_type.starts_with("image/") {
        ("image", FileType::Image)
    } else if mime_type.starts_with("video/") {
        ("video", FileType::Video)
    } else if mime_type == "application/pdf" {
        ("raw", FileType::Document)
    } else {
        ("raw", FileType::Raw)
    }
}

/// One file ready to be sent to the media host
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub file: StagedFile,
    pub resource_type: &'static str,
    pub file_type: FileType,
}

impl UploadRequest {
    pub fn new(file: StagedFile) -> Self {
        let (resource_type, file_type) = classify(&file.mime_type);
        Self {
            file,
            resource_type,
            file_type,
        }
    }

    /// Metadata to persist for this file once the host has accepted it
    pub fn file_reference(&self, asset: UploadedAsset) -> FileReference {
        FileReference {
            public_id: asset.public_id,
            version: asset.version,
            signature: asset.signature,
            resource_type: asset
                .resource_type
                .unwrap_or_else(|| self.resource_type.to_string()),
            secure_url: asset.secure_url,
            original_filename: self.file.original_filename.clone(),
            format: asset.format.unwrap_or_default(),
            bytes: asset.bytes,
            file_type: self.file_type,
        }
    }
}

/// What the media host reports for an accepted upload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadedAsset {
    pub public_id: String,
    pub version: Option<String>,
    pub signature: Option<String>,
    pub resource_type: Option<String>,
    pub secure_url: String,
    pub format: Option<String>,
    pub bytes: u64,
}

/// Remote media host
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadedAsset>;
}
