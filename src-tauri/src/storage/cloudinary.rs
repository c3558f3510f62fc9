//! Cloudinary media host
//!
//! Files are sent as unsigned multipart uploads authorised by the upload
//! preset; no API secret ever ships with the app.

use super::{MediaHost, UploadRequest, UploadedAsset};
use crate::config::BackendConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct UploadResponse {
    public_id: Option<String>,
    version: Option<Value>,
    signature: Option<String>,
    resource_type: Option<String>,
    secure_url: Option<String>,
    format: Option<String>,
    bytes: Option<u64>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    config: BackendConfig,
}

impl CloudinaryClient {
    pub fn new(client: reqwest::Client, config: BackendConfig) -> Self {
        Self { client, config }
    }
}

fn parse_upload_response(status: u16, body: &str) -> Result<UploadedAsset> {
    let response: UploadResponse = serde_json::from_str(body).map_err(|e| {
        AppError::DataIntegrity(format!("Unreadable upload response ({}): {}", status, e))
    })?;

    if let Some(error) = response.error {
        return Err(AppError::Remote {
            service: "Media host",
            status,
            message: error.message,
        });
    }

    let (Some(public_id), Some(secure_url)) = (response.public_id, response.secure_url) else {
        return Err(AppError::DataIntegrity(
            "Upload response is missing public_id or secure_url".to_string(),
        ));
    };

    let version = response.version.map(|v| match v {
        Value::String(s) => s,
        other => other.to_string(),
    });

    Ok(UploadedAsset {
        public_id,
        version,
        signature: response.signature,
        resource_type: response.resource_type,
        secure_url,
        format: response.format,
        bytes: response.bytes.unwrap_or(0),
    })
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadedAsset> {
        let file = &request.file;
        let data = tokio::fs::read(&file.path).await?;
        tracing::debug!(
            "Uploading '{}' ({} bytes, {}) as {}",
            file.original_filename,
            data.len(),
            file.mime_type,
            request.resource_type
        );

        let part = Part::bytes(data)
            .file_name(file.original_filename.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new()
            .text("upload_preset", self.config.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(self.config.upload_url(request.resource_type))
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let asset = parse_upload_response(status, &body)?;

        tracing::info!("Uploaded '{}' as {}", file.original_filename, asset.public_id);
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let body = r#"{
            "asset_id": "x",
            "public_id": "deer_1",
            "version": 1717171717,
            "signature": "sig",
            "resource_type": "image",
            "format": "jpg",
            "bytes": 52311,
            "secure_url": "https://res.cloudinary.com/demo/image/upload/deer_1.jpg"
        }"#;

        let asset = parse_upload_response(200, body).unwrap();
        assert_eq!(asset.public_id, "deer_1");
        assert_eq!(asset.version.as_deref(), Some("1717171717"));
        assert_eq!(asset.bytes, 52311);
    }

    #[test]
    fn test_parse_host_error() {
        let body = r#"{ "error": { "message": "Upload preset not found" } }"#;

        match parse_upload_response(400, body) {
            Err(AppError::Remote { status, message, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Upload preset not found");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_url() {
        let body = r#"{ "public_id": "deer_1" }"#;
        assert!(matches!(
            parse_upload_response(200, body),
            Err(AppError::DataIntegrity(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let host = CloudinaryClient::new(reqwest::Client::new(), BackendConfig::default());
        let request = UploadRequest::new(super::super::StagedFile::from_locator(
            "/definitely/not/here.jpg",
        ));

        assert!(matches!(host.upload(&request).await, Err(AppError::Io(_))));
    }
}
