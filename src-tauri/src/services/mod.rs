//! Services module
//!
//! Per-screen state holders that coordinate between commands and the
//! remote collaborators.

pub mod auth;
pub mod complaints;
pub mod location;
pub mod reports;
pub mod roles;

pub use auth::{AuthService, AuthState};
pub use complaints::{ComplaintsService, DraftUpdate, FormField, SubmissionState, SubmitSnapshot};
pub use location::{fetch_location, Coordinates, LocationProvider, LocationService, ReportedLocation};
pub use reports::{
    ListScope, ReportDetailService, ReportDetailSnapshot, ReportDetailState, ReportListService,
    ReportListState, UpdateReportState,
};
pub use roles::{Role, RoleResolver};
