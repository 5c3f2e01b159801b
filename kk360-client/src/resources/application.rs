//! Scholarship applications as the admin dashboard lists them.

use super::{names, normalize_list, text, text_or_empty, timestamp};
use kk360_core::{EntityKey, Filterable, Keyed, Timestamp};
use serde_json::Value;
use std::fmt;

/// Review stage of an application, normalized from the server's labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    UnderReview,
    TeleVerification,
    PanelInterview,
    Selected,
    Rejected,
    Other(String),
}

impl ApplicationStatus {
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "pending" | "under_review" | "under-review" => Self::UnderReview,
            "tele-verification" | "tele_verification" => Self::TeleVerification,
            "panel-interview" | "panel_interview" => Self::PanelInterview,
            "selected" => Self::Selected,
            "rejected" => Self::Rejected,
            other => Self::Other(other.to_string()),
        }
    }

    /// Normalized label used for filtering and display.
    pub fn as_str(&self) -> &str {
        match self {
            Self::UnderReview => "under_review",
            Self::TeleVerification => "tele_verification",
            Self::PanelInterview => "panel_interview",
            Self::Selected => "selected",
            Self::Rejected => "rejected",
            Self::Other(raw) => raw,
        }
    }

    /// Label the server stores.
    pub fn as_wire(&self) -> &str {
        match self {
            Self::UnderReview => "pending",
            Self::TeleVerification => "tele-verification",
            Self::PanelInterview => "panel-interview",
            Self::Selected => "selected",
            Self::Rejected => "rejected",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub id: String,
    pub application_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub class: String,
    pub medium: String,
    pub subjects: Vec<String>,
    pub status: ApplicationStatus,
    pub submitted_at: Option<Timestamp>,
}

impl Application {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let id = text(raw, &["_id", "id"])?;
        Some(Self {
            application_number: text(raw, &["applicationNumber", "applicationId", "_id"])
                .unwrap_or_else(|| id.clone()),
            name: text_or_empty(raw, &["personalInfo.fullName", "name"]),
            email: text_or_empty(raw, &["personalInfo.email", "email"]),
            phone: text_or_empty(raw, &["personalInfo.phone", "phone"]),
            class: text_or_empty(raw, &["educationalInfo.currentClass", "class"]),
            medium: text_or_empty(raw, &["educationalInfo.medium", "medium"]),
            subjects: names(
                super::at(raw, "educationalInfo.subjects").or_else(|| raw.get("subjects")),
            ),
            status: ApplicationStatus::normalize(&text_or_empty(raw, &["status"])),
            submitted_at: timestamp(raw, &["createdAt", "submissionDate"]),
            id,
        })
    }

    /// Accepts a bare array or `{applications: [...]}`.
    pub fn list_from_raw(payload: &Value) -> Vec<Self> {
        normalize_list(payload, "applications", Self::from_raw)
    }

    pub fn with_status(&self, status: ApplicationStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl Keyed for Application {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.clone())
    }
}

impl Filterable for Application {
    fn field_values(&self, field: &str) -> Vec<&str> {
        match field {
            "status" => vec![self.status.as_str()],
            "class" => vec![self.class.as_str()],
            "medium" => vec![self.medium.as_str()],
            "subject" => self.subjects.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.application_number.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_normalization() {
        assert_eq!(ApplicationStatus::normalize(""), ApplicationStatus::UnderReview);
        assert_eq!(ApplicationStatus::normalize("pending"), ApplicationStatus::UnderReview);
        assert_eq!(
            ApplicationStatus::normalize("tele-verification"),
            ApplicationStatus::TeleVerification
        );
        assert_eq!(
            ApplicationStatus::normalize("Panel-Interview"),
            ApplicationStatus::PanelInterview
        );
        assert_eq!(
            ApplicationStatus::normalize("waitlisted"),
            ApplicationStatus::Other("waitlisted".to_string())
        );
        assert_eq!(ApplicationStatus::TeleVerification.as_wire(), "tele-verification");
        assert_eq!(ApplicationStatus::UnderReview.as_wire(), "pending");
    }

    #[test]
    fn test_from_raw_coalesces_nested_fields() {
        let raw = json!({
            "_id": "665f",
            "applicationNumber": "KK-2024-001",
            "personalInfo": { "fullName": "Ravi Kumar", "email": "ravi@example.org", "phone": "98400" },
            "educationalInfo": {
                "currentClass": "10",
                "medium": "Tamil",
                "subjects": ["Maths", { "name": "Science" }]
            },
            "status": "tele-verification",
            "createdAt": "2024-06-01T10:00:00Z"
        });
        let app = Application::from_raw(&raw).unwrap();
        assert_eq!(app.id, "665f");
        assert_eq!(app.application_number, "KK-2024-001");
        assert_eq!(app.name, "Ravi Kumar");
        assert_eq!(app.phone, "98400");
        assert_eq!(app.subjects, vec!["Maths", "Science"]);
        assert_eq!(app.status, ApplicationStatus::TeleVerification);
        assert!(app.submitted_at.is_some());
        assert_eq!(app.field_values("subject"), vec!["Maths", "Science"]);
    }

    #[test]
    fn test_from_raw_falls_back_to_top_level() {
        let raw = json!({ "id": "a1", "name": "Kavya", "email": "k@example.org" });
        let app = Application::from_raw(&raw).unwrap();
        assert_eq!(app.application_number, "a1");
        assert_eq!(app.email, "k@example.org");
        assert_eq!(app.status, ApplicationStatus::UnderReview);
        assert_eq!(app.submitted_at, None);
    }

    #[test]
    fn test_records_without_id_are_skipped() {
        let payload = json!({ "applications": [{ "name": "no id" }, { "_id": "x" }] });
        let apps = Application::list_from_raw(&payload);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].id, "x");
    }
}
