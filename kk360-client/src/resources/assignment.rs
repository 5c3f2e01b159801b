//! Class assignments managed by tutors.

use super::{at, normalize_list, text, text_or_empty, timestamp};
use kk360_core::{EntityKey, Filterable, Keyed, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether the due date is still ahead. Derived, never sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Ended,
}

impl AssignmentStatus {
    /// Assignments without a readable due date stay active.
    pub fn at(due_date: Option<Timestamp>, now: Timestamp) -> Self {
        match due_date {
            Some(due) if due <= now => Self::Ended,
            _ => Self::Active,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub title: String,
    pub description: String,
    pub class_id: String,
    pub due_date: Option<Timestamp>,
    pub submission_count: usize,
    pub status: AssignmentStatus,
}

impl Assignment {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        Self::from_raw_at(raw, chrono::Utc::now())
    }

    /// Normalize against a fixed clock.
    pub fn from_raw_at(raw: &Value, now: Timestamp) -> Option<Self> {
        let due_date = timestamp(raw, &["dueDate"]);
        Some(Self {
            id: text(raw, &["_id", "id"])?,
            title: text_or_empty(raw, &["title"]),
            description: text_or_empty(raw, &["description"]),
            class_id: text_or_empty(raw, &["class._id", "class", "classId"]),
            due_date,
            submission_count: at(raw, "submissions")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
            status: AssignmentStatus::at(due_date, now),
        })
    }

    /// Accepts a bare array or `{assignments: [...]}`.
    pub fn list_from_raw(payload: &Value) -> Vec<Self> {
        normalize_list(payload, "assignments", Self::from_raw)
    }

    /// Create and update replies are the assignment itself or
    /// `{assignment: {...}}`.
    pub fn from_response(payload: &Value) -> Option<Self> {
        payload
            .get("assignment")
            .and_then(Self::from_raw)
            .or_else(|| Self::from_raw(payload))
    }

    /// Local copy with the draft's editable fields applied.
    pub fn with_draft(&self, draft: &AssignmentDraft) -> Self {
        Self {
            title: draft.title.clone(),
            description: draft.description.clone(),
            due_date: Some(draft.due_date),
            status: AssignmentStatus::at(Some(draft.due_date), chrono::Utc::now()),
            ..self.clone()
        }
    }
}

impl Keyed for Assignment {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.clone())
    }
}

impl Filterable for Assignment {
    fn field_values(&self, field: &str) -> Vec<&str> {
        match field {
            "status" => vec![self.status.as_str()],
            "class" => vec![self.class_id.as_str()],
            _ => Vec::new(),
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str()]
    }
}

/// Body for creating or editing an assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDraft {
    pub title: String,
    pub description: String,
    pub due_date: Timestamp,
    /// Only sent on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn july(day: u32) -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 7, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_from_raw_derives_status_and_counts() {
        let raw = json!({
            "_id": "as1",
            "title": "Fractions worksheet",
            "class": { "_id": "c9" },
            "dueDate": "2024-07-10T00:00:00.000Z",
            "submissions": [{ "student": "s1" }, { "student": "s2" }]
        });
        let before = Assignment::from_raw_at(&raw, july(1)).unwrap();
        assert_eq!(before.status, AssignmentStatus::Active);
        assert_eq!(before.class_id, "c9");
        assert_eq!(before.submission_count, 2);

        let after = Assignment::from_raw_at(&raw, july(20)).unwrap();
        assert_eq!(after.status, AssignmentStatus::Ended);
    }

    #[test]
    fn test_missing_due_date_stays_active() {
        let raw = json!({ "_id": "as2", "title": "Essay", "class": "c9" });
        let assignment = Assignment::from_raw_at(&raw, july(1)).unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Active);
        assert_eq!(assignment.class_id, "c9");
        assert_eq!(assignment.submission_count, 0);
    }

    #[test]
    fn test_response_may_be_wrapped() {
        let wrapped = json!({ "assignment": { "_id": "as3", "title": "Map work" } });
        assert_eq!(Assignment::from_response(&wrapped).unwrap().id, "as3");
        assert!(Assignment::from_response(&json!({ "message": "ok" })).is_none());
    }

    #[test]
    fn test_draft_serializes_camel_case() {
        let draft = AssignmentDraft {
            title: "Map work".to_string(),
            description: String::new(),
            due_date: july(10),
            class_id: None,
        };
        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(body["dueDate"], json!("2024-07-10T00:00:00Z"));
        assert!(body.get("classId").is_none());
    }
}
