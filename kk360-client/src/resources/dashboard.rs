//! Admin dashboard totals.

use super::count;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_applications: u64,
    pub pending_applications: u64,
    pub tele_verification_applications: u64,
    pub selected_applications: u64,
}

impl DashboardStats {
    /// Missing or non-numeric fields read as 0.
    pub fn from_raw(raw: &Value) -> Self {
        let raw = raw.get("stats").unwrap_or(raw);
        Self {
            total_applications: count(raw, "totalApplications"),
            pending_applications: count(raw, "pendingApplications"),
            tele_verification_applications: count(raw, "teleVerificationApplications"),
            selected_applications: count(raw, "selectedApplications"),
        }
    }
}
