//! Screen routes

use crate::services::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum Route {
    Login,
    SignUp,
    Home,
    SubmitComplaint,
    MyReports,
    Profile,
    AdminDashboard,
    #[serde(rename_all = "camelCase")]
    ReportDetail { report_id: String },
}

impl Route {
    /// Landing screen after sign-in for a given role
    pub fn dashboard_for(role: Role) -> Route {
        if role.is_admin() {
            Route::AdminDashboard
        } else {
            Route::Home
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "login".to_string(),
            Route::SignUp => "signup".to_string(),
            Route::Home => "home".to_string(),
            Route::SubmitComplaint => "submit_complaint".to_string(),
            Route::MyReports => "my_reports".to_string(),
            Route::Profile => "profile".to_string(),
            Route::AdminDashboard => "admin_dashboard".to_string(),
            Route::ReportDetail { report_id } => format!("report_detail/{}", report_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_for_role() {
        assert_eq!(Route::dashboard_for(Role::Administrator), Route::AdminDashboard);
        assert_eq!(Route::dashboard_for(Role::FAIL_CLOSED), Route::Home);
    }

    #[test]
    fn test_report_detail_path() {
        let route = Route::ReportDetail {
            report_id: "abc123".to_string(),
        };
        assert_eq!(route.path(), "report_detail/abc123");

        let value = serde_json::to_value(&route).unwrap();
        assert_eq!(value["screen"], "reportDetail");
        assert_eq!(value["reportId"], "abc123");
    }
}
