//! Mentoring sessions and session requests.

use super::{names, normalize_list, text, text_or_empty, timestamp};
use kk360_core::{EntityKey, Filterable, Keyed, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Approved,
    Rejected,
    Scheduled,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "scheduled" => Some(Self::Scheduled),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Only sessions that have not happened or ended can be cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved | Self::Scheduled)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MentoringSession {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub tutor_name: String,
    pub student_names: Vec<String>,
    pub date: Option<Timestamp>,
    pub start_time: String,
    pub duration: String,
    pub status: SessionStatus,
}

impl MentoringSession {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let status = text(raw, &["status"])
            .and_then(|s| SessionStatus::parse(&s))
            .unwrap_or(SessionStatus::Scheduled);
        Some(Self {
            id: text(raw, &["_id", "id"])?,
            title: text_or_empty(raw, &["title"]),
            topic: text_or_empty(raw, &["topic"]),
            tutor_name: text_or_empty(raw, &["tutor.user.name", "tutor.name"]),
            student_names: names(raw.get("students")),
            date: timestamp(raw, &["date"]),
            start_time: text_or_empty(raw, &["startTime"]),
            duration: text_or_empty(raw, &["duration"]),
            status,
        })
    }

    /// Accepts a bare array or `{sessions: [...]}`.
    pub fn list_from_raw(payload: &Value) -> Vec<Self> {
        normalize_list(payload, "sessions", Self::from_raw)
    }

    /// Server replies may wrap the session as `{session: {...}}`.
    pub fn from_response(payload: &Value) -> Option<Self> {
        payload
            .get("session")
            .and_then(Self::from_raw)
            .or_else(|| Self::from_raw(payload))
    }

    pub fn with_status(&self, status: SessionStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl Keyed for MentoringSession {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.clone())
    }
}

impl Filterable for MentoringSession {
    fn field_values(&self, field: &str) -> Vec<&str> {
        match field {
            "status" => vec![self.status.as_str()],
            _ => Vec::new(),
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.topic.as_str()];
        fields.extend(self.student_names.iter().map(String::as_str));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_raw_reads_populated_names() {
        let raw = json!({
            "_id": "m1",
            "title": "Doubt clearing",
            "topic": "Quadratic equations",
            "tutor": { "user": { "name": "Arun" } },
            "students": [{ "user": { "name": "Ravi" } }, { "user": { "name": "Kavya" } }],
            "date": "2024-07-01T00:00:00.000Z",
            "startTime": "16:00",
            "duration": "45",
            "status": "pending"
        });
        let session = MentoringSession::from_raw(&raw).unwrap();
        assert_eq!(session.tutor_name, "Arun");
        assert_eq!(session.student_names, vec!["Ravi", "Kavya"]);
        assert_eq!(session.status, SessionStatus::Pending);
        assert!(session.search_fields().contains(&"Kavya"));
    }

    #[test]
    fn test_response_may_be_wrapped() {
        let wrapped = json!({ "message": "ok", "session": { "_id": "m1", "status": "scheduled" } });
        let session = MentoringSession::from_response(&wrapped).unwrap();
        assert_eq!(session.status, SessionStatus::Scheduled);
    }

    #[test]
    fn test_cancellable_states() {
        assert!(SessionStatus::Scheduled.is_cancellable());
        assert!(!SessionStatus::Completed.is_cancellable());
        assert!(!SessionStatus::Cancelled.is_cancellable());
    }
}
