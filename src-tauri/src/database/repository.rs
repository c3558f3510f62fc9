//! Repository layer for database operations
//!
//! Typed complaint and profile operations on top of a [`DocumentStore`].
//! Every write touches exactly one document.

use super::models::*;
use super::{Direction, Document, DocumentStore, Fields, Query};
use crate::config::{COMPLAINTS_COLLECTION, USERS_COLLECTION};
use crate::error::{AppError, Result};
use serde_json::{json, Value};
use std::sync::Arc;

const SUBMISSION_TIMESTAMP: &str = "submissionTimestamp";
const LAST_STATUS_UPDATE_TIMESTAMP: &str = "lastStatusUpdateTimestamp";

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

/// Decode a stored complaint, taking its id from the document name
pub fn complaint_from_document(doc: Document) -> Result<ComplaintData> {
    let mut complaint: ComplaintData = serde_json::from_value(Value::Object(doc.fields))
        .map_err(|e| {
            AppError::DataIntegrity(format!("Complaint {} could not be decoded: {}", doc.id, e))
        })?;
    complaint.id = doc.id;
    Ok(complaint)
}

fn to_fields(value: Value) -> Result<Fields> {
    match value {
        Value::Object(fields) => Ok(fields),
        other => Err(AppError::DataIntegrity(format!(
            "Expected an object, got {}",
            other
        ))),
    }
}

impl Repository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a new complaint and return its generated id.
    ///
    /// The id field is never written, and both timestamps are set by the
    /// store's clock rather than taken from the record.
    pub async fn create_complaint(&self, complaint: &ComplaintData) -> Result<String> {
        let mut fields = to_fields(serde_json::to_value(complaint)?)?;
        fields.remove("id");
        fields.remove(SUBMISSION_TIMESTAMP);
        fields.remove(LAST_STATUS_UPDATE_TIMESTAMP);

        let id = self
            .store
            .create(
                COMPLAINTS_COLLECTION,
                fields,
                &[SUBMISSION_TIMESTAMP, LAST_STATUS_UPDATE_TIMESTAMP],
            )
            .await?;

        tracing::debug!("Created complaint: {}", id);
        Ok(id)
    }

    /// Get a complaint by ID; `None` when no such document exists
    pub async fn get_complaint(&self, id: &str) -> Result<Option<ComplaintData>> {
        self.store
            .get(COMPLAINTS_COLLECTION, id)
            .await?
            .map(complaint_from_document)
            .transpose()
    }

    /// List complaints newest first, optionally only those of one user.
    ///
    /// Documents without a submission timestamp are not listed. Documents
    /// that fail to decode are skipped.
    pub async fn list_complaints(&self, user_id: Option<&str>) -> Result<Vec<ComplaintData>> {
        let mut query = Query::new();
        if let Some(uid) = user_id {
            query = query.where_eq("userId", uid);
        }
        let query = query.order_by(SUBMISSION_TIMESTAMP, Direction::Descending);

        let docs = self.store.query(COMPLAINTS_COLLECTION, &query).await?;
        let total = docs.len();

        let complaints: Vec<ComplaintData> = docs
            .into_iter()
            .filter_map(|doc| match complaint_from_document(doc) {
                Ok(complaint) => Some(complaint),
                Err(e) => {
                    tracing::warn!("Skipping complaint: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Listed {} of {} complaints", complaints.len(), total);
        Ok(complaints)
    }

    /// Set status and remarks on an existing complaint.
    ///
    /// Only these fields, the updating administrator and the status update
    /// timestamp change; everything else on the document is left alone.
    pub async fn update_complaint_status(
        &self,
        id: &str,
        status: &str,
        admin_remarks: &str,
        admin_uid: &str,
    ) -> Result<()> {
        let fields = to_fields(json!({
            "status": status,
            "adminRemarks": admin_remarks,
            "lastUpdatedByAdminUid": admin_uid,
        }))?;

        self.store
            .update(COMPLAINTS_COLLECTION, id, fields, &[LAST_STATUS_UPDATE_TIMESTAMP])
            .await?;

        tracing::debug!("Updated status of complaint {} to {}", id, status);
        Ok(())
    }

    /// Get the profile document of a user, if one exists
    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let Some(doc) = self.store.get(USERS_COLLECTION, uid).await? else {
            return Ok(None);
        };

        let profile = serde_json::from_value(Value::Object(doc.fields)).map_err(|e| {
            AppError::DataIntegrity(format!("Profile {} could not be decoded: {}", uid, e))
        })?;
        Ok(Some(profile))
    }
}
