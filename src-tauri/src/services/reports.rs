//! Report listing and report detail
//!
//! [`ReportListService`] backs both the "My Reports" screen and the
//! administrator dashboard. [`ReportDetailService`] shows one report and
//! lets an administrator change its status and remarks.

use super::roles::RoleResolver;
use crate::auth::IdentityProvider;
use crate::config::ADMIN_COMPLAINT_STATUSES;
use crate::database::{ComplaintData, Repository};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReportListState {
    Loading,
    Success { reports: Vec<ComplaintData> },
    Empty,
    Error { message: String },
}

/// Which complaints a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListScope {
    /// Complaints submitted by the signed-in user
    Mine,
    /// Every complaint, for the administrator dashboard
    All,
}

#[derive(Clone)]
pub struct ReportListService {
    scope: ListScope,
    identity: Arc<dyn IdentityProvider>,
    repo: Repository,
    state: Arc<RwLock<ReportListState>>,
}

impl ReportListService {
    pub fn new(scope: ListScope, identity: Arc<dyn IdentityProvider>, repo: Repository) -> Self {
        Self {
            scope,
            identity,
            repo,
            state: Arc::new(RwLock::new(ReportListState::Loading)),
        }
    }

    pub async fn state(&self) -> ReportListState {
        self.state.read().await.clone()
    }

    /// Run the list query again from scratch
    pub async fn refresh(&self) -> ReportListState {
        *self.state.write().await = ReportListState::Loading;

        let state = match self.fetch().await {
            Ok(reports) if reports.is_empty() => ReportListState::Empty,
            Ok(reports) => ReportListState::Success { reports },
            Err(e) => {
                tracing::error!("Failed to fetch {:?} reports: {}", self.scope, e);
                ReportListState::Error {
                    message: e.to_string(),
                }
            }
        };

        *self.state.write().await = state.clone();
        state
    }

    async fn fetch(&self) -> Result<Vec<ComplaintData>> {
        match self.scope {
            ListScope::Mine => {
                let user = self.identity.current_user().ok_or_else(|| {
                    AppError::Auth("User not authenticated. Please log in.".to_string())
                })?;
                self.repo.list_complaints(Some(user.uid.as_str())).await
            }
            ListScope::All => self.repo.list_complaints(None).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReportDetailState {
    Loading,
    Success { report: ComplaintData },
    NotFound,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UpdateReportState {
    Idle,
    Loading,
    Success,
    Error { message: String },
}

/// Everything the report detail screen renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetailSnapshot {
    pub report_id: Option<String>,
    pub state: ReportDetailState,
    pub update_state: UpdateReportState,
    /// Whether the administrator controls are shown
    pub is_admin: bool,
}

struct Detail {
    report_id: Option<String>,
    state: ReportDetailState,
    update_state: UpdateReportState,
    is_admin: bool,
}

impl Detail {
    fn snapshot(&self) -> ReportDetailSnapshot {
        ReportDetailSnapshot {
            report_id: self.report_id.clone(),
            state: self.state.clone(),
            update_state: self.update_state.clone(),
            is_admin: self.is_admin,
        }
    }
}

#[derive(Clone)]
pub struct ReportDetailService {
    identity: Arc<dyn IdentityProvider>,
    repo: Repository,
    roles: RoleResolver,
    detail: Arc<RwLock<Detail>>,
}

impl ReportDetailService {
    pub fn new(identity: Arc<dyn IdentityProvider>, repo: Repository, roles: RoleResolver) -> Self {
        Self {
            identity,
            repo,
            roles,
            detail: Arc::new(RwLock::new(Detail {
                report_id: None,
                state: ReportDetailState::Loading,
                update_state: UpdateReportState::Idle,
                is_admin: false,
            })),
        }
    }

    pub async fn snapshot(&self) -> ReportDetailSnapshot {
        self.detail.read().await.snapshot()
    }

    /// Show the report with the given id
    pub async fn open(&self, report_id: &str) -> ReportDetailSnapshot {
        {
            let mut detail = self.detail.write().await;
            detail.update_state = UpdateReportState::Idle;
            if report_id.trim().is_empty() {
                tracing::error!("Report detail opened without a report id");
                detail.report_id = None;
                detail.state = ReportDetailState::Error {
                    message: "Report ID not provided.".to_string(),
                };
                return detail.snapshot();
            }
            detail.report_id = Some(report_id.to_string());
        }

        self.refresh().await
    }

    /// Fetch the open report again and re-check the viewer's role
    pub async fn refresh(&self) -> ReportDetailSnapshot {
        let is_admin = self.viewer_is_admin().await;

        let report_id = {
            let mut detail = self.detail.write().await;
            detail.is_admin = is_admin;
            match detail.report_id.clone() {
                Some(id) => id,
                None => return detail.snapshot(),
            }
        };

        self.load(&report_id).await
    }

    async fn viewer_is_admin(&self) -> bool {
        match self.identity.current_user() {
            Some(user) => self.roles.resolve(&user.uid).await.is_admin(),
            None => false,
        }
    }

    async fn load(&self, report_id: &str) -> ReportDetailSnapshot {
        self.detail.write().await.state = ReportDetailState::Loading;

        let state = match self.repo.get_complaint(report_id).await {
            Ok(Some(report)) => ReportDetailState::Success { report },
            Ok(None) => {
                tracing::warn!("No report found with id {}", report_id);
                ReportDetailState::NotFound
            }
            Err(AppError::DataIntegrity(e)) => {
                tracing::error!("{}", e);
                ReportDetailState::Error {
                    message: "Could not parse report data.".to_string(),
                }
            }
            Err(e) => {
                tracing::error!("Failed to fetch report {}: {}", report_id, e);
                ReportDetailState::Error {
                    message: e.to_string(),
                }
            }
        };

        let mut detail = self.detail.write().await;
        detail.state = state;
        detail.snapshot()
    }

    /// Set status and remarks on the open report.
    ///
    /// Rejected without any write unless the signed-in user resolves to an
    /// administrator. On success the report is fetched again.
    pub async fn update_status_and_remarks(&self, status: &str, remarks: &str) -> ReportDetailSnapshot {
        let report_id = self.detail.read().await.report_id.clone();

        let result = self.try_update(report_id.as_deref(), status, remarks).await;

        match result {
            Ok(report_id) => {
                self.detail.write().await.update_state = UpdateReportState::Success;
                self.load(&report_id).await
            }
            Err(e) => {
                let mut detail = self.detail.write().await;
                detail.update_state = UpdateReportState::Error {
                    message: e.to_string(),
                };
                detail.snapshot()
            }
        }
    }

    async fn try_update(&self, report_id: Option<&str>, status: &str, remarks: &str) -> Result<String> {
        let report_id = report_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Cannot update: Report ID is missing.".to_string()))?;

        let admin = self.identity.current_user().ok_or_else(|| {
            AppError::Unauthorized("Cannot update: Admin user not identified.".to_string())
        })?;

        let role = self.roles.resolve(&admin.uid).await;
        self.detail.write().await.is_admin = role.is_admin();
        if !role.is_admin() {
            tracing::warn!("Update of report {} by non-admin {} denied", report_id, admin.uid);
            return Err(AppError::Unauthorized(
                "Unauthorized: This action requires admin privileges.".to_string(),
            ));
        }

        if !ADMIN_COMPLAINT_STATUSES.contains(&status) {
            return Err(AppError::Validation(format!("Unknown status '{}'.", status)));
        }

        self.detail.write().await.update_state = UpdateReportState::Loading;

        tracing::info!(
            "Admin {} updating report {} to '{}'",
            admin.uid,
            report_id,
            status
        );
        self.repo
            .update_complaint_status(report_id, status, remarks, &admin.uid)
            .await?;

        Ok(report_id.to_string())
    }

    pub async fn reset_update_state(&self) -> ReportDetailSnapshot {
        let mut detail = self.detail.write().await;
        detail.update_state = UpdateReportState::Idle;
        detail.snapshot()
    }
}
