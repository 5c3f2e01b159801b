//! Per-class attendance for one date.

use super::{list_items, text};
use kk360_core::{EntityKey, Filterable, Keyed};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const KEY_NAMESPACE: &str = "attendance";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    /// Anything other than `present` counts as absent.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("present") {
            Self::Present
        } else {
            Self::Absent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

/// One student's row on the attendance sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub student_id: String,
    pub name: String,
    pub status: AttendanceStatus,
}

impl AttendanceEntry {
    pub fn new(student_id: impl Into<String>, name: impl Into<String>, status: AttendanceStatus) -> Self {
        Self {
            student_id: student_id.into(),
            name: name.into(),
            status,
        }
    }

    /// Merge a roster student with their attendance record for `class_id`.
    pub fn from_raw(raw: &Value, class_id: &str) -> Option<Self> {
        let student_id = text(raw, &["_id", "id", "studentId"])?;
        let name = text(raw, &["user.name", "name"]).unwrap_or_else(|| "Student".to_string());
        let status = raw
            .get("attendance")
            .and_then(Value::as_array)
            .and_then(|records| {
                records
                    .iter()
                    .find(|record| text(record, &["class", "classId"]).as_deref() == Some(class_id))
            })
            .and_then(|record| text(record, &["status"]))
            .map(|status| AttendanceStatus::parse(&status))
            .unwrap_or(AttendanceStatus::Absent);
        Some(Self {
            student_id,
            name,
            status,
        })
    }

    pub fn list_from_raw(payload: &Value, class_id: &str) -> Vec<Self> {
        let raw = list_items(payload, "students");
        raw.iter()
            .filter_map(|student| Self::from_raw(student, class_id))
            .collect()
    }

    pub fn key_for(student_id: &str) -> EntityKey {
        EntityKey::scoped(KEY_NAMESPACE, student_id)
    }

    pub fn with_status(&self, status: AttendanceStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl Keyed for AttendanceEntry {
    fn key(&self) -> EntityKey {
        Self::key_for(&self.student_id)
    }
}

impl Filterable for AttendanceEntry {
    fn field_values(&self, field: &str) -> Vec<&str> {
        match field {
            "status" => vec![self.status.as_str()],
            _ => Vec::new(),
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

/// Wire shape of one entry in `{attendanceData: [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    pub student_id: String,
    pub status: AttendanceStatus,
}

/// Totals derived from the current roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub rate_percent: u32,
}

impl AttendanceSummary {
    pub fn from_entries(entries: &[AttendanceEntry]) -> Self {
        let total = entries.len();
        let present = entries
            .iter()
            .filter(|entry| entry.status == AttendanceStatus::Present)
            .count();
        let rate_percent = if total == 0 {
            0
        } else {
            ((present as f64 / total as f64) * 100.0).round() as u32
        };
        Self {
            total,
            present,
            absent: total - present,
            rate_percent,
        }
    }
}
