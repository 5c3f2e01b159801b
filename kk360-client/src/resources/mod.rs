//! Server records normalized into keyed, filterable view items.
//!
//! Normalization runs once at the load boundary. The server is loose about
//! field names, so every reader here coalesces over a list of candidate paths.

pub mod application;
pub mod assignment;
pub mod attendance;
pub mod automap;
pub mod dashboard;
pub mod mentoring;
pub mod selected;
pub mod tutor;

pub use application::{Application, ApplicationStatus};
pub use assignment::{Assignment, AssignmentDraft, AssignmentStatus};
pub use attendance::{AttendanceEntry, AttendanceMark, AttendanceStatus, AttendanceSummary};
pub use automap::{AutoMapKind, AutoMapOutcome};
pub use dashboard::DashboardStats;
pub use mentoring::{MentoringSession, SessionStatus};
pub use selected::{group_by_tutor, SelectedStudent, TutorGroup, TutorRef};
pub use tutor::{MeetLink, TutorDetail};

use kk360_core::Timestamp;
use serde_json::Value;

/// Elements of a list payload: a bare array, or an array under `wrapper`.
pub(crate) fn list_items<'a>(payload: &'a Value, wrapper: &str) -> &'a [Value] {
    match payload {
        Value::Array(items) => items,
        Value::Object(map) => match map.get(wrapper) {
            Some(Value::Array(items)) => items,
            _ => {
                tracing::debug!(wrapper, "list payload has no array under wrapper key");
                &[]
            }
        },
        _ => &[],
    }
}

/// Normalize every element, skipping the ones `from_raw` rejects.
pub(crate) fn normalize_list<T>(
    payload: &Value,
    wrapper: &str,
    from_raw: impl Fn(&Value) -> Option<T>,
) -> Vec<T> {
    let raw = list_items(payload, wrapper);
    let items: Vec<T> = raw.iter().filter_map(&from_raw).collect();
    if items.len() < raw.len() {
        tracing::debug!(
            wrapper,
            skipped = raw.len() - items.len(),
            "skipped unusable records"
        );
    }
    items
}

/// Follow a dotted path like `personalInfo.fullName`.
pub(crate) fn at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| current.get(segment))
}

/// First non-blank string (or number) found at any of `paths`.
pub(crate) fn text(value: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| match at(value, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn text_or_empty(value: &Value, paths: &[&str]) -> String {
    text(value, paths).unwrap_or_default()
}

/// Strings from an array whose elements are strings or `{name}` objects.
pub(crate) fn names(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            other => text(other, &["name", "user.name", "title"]),
        })
        .filter(|s| !s.is_empty())
        .collect()
}

pub(crate) fn count(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}

pub(crate) fn timestamp(value: &Value, paths: &[&str]) -> Option<Timestamp> {
    let raw = text(value, paths)?;
    chrono::DateTime::parse_from_rfc3339(&raw)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_items_accepts_bare_and_wrapped() {
        let bare = json!([1, 2]);
        let wrapped = json!({ "rows": [1, 2, 3] });
        assert_eq!(list_items(&bare, "rows").len(), 2);
        assert_eq!(list_items(&wrapped, "rows").len(), 3);
        assert!(list_items(&wrapped, "tutors").is_empty());
        assert!(list_items(&json!("oops"), "rows").is_empty());
    }

    #[test]
    fn test_text_coalesces_in_order() {
        let value = json!({ "personalInfo": { "fullName": "  " }, "name": "Ravi" });
        assert_eq!(
            text(&value, &["personalInfo.fullName", "name"]).as_deref(),
            Some("Ravi")
        );
        assert_eq!(text(&value, &["missing"]), None);
    }

    #[test]
    fn test_names_reads_strings_and_objects() {
        let value = json!(["Maths", { "name": "Physics" }, { "other": 1 }, ""]);
        assert_eq!(names(Some(&value)), vec!["Maths", "Physics"]);
    }
}
