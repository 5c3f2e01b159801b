//! Result of a server-side auto-map run.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoMapKind {
    Students,
    Applications,
}

impl AutoMapKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Students => "Auto-map",
            Self::Applications => "Application auto-map",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutoMapOutcome {
    pub kind: AutoMapKind,
    pub assigned: u64,
    /// Full response, for callers that want the individual mappings.
    pub raw: Value,
}

impl AutoMapOutcome {
    /// `totalMapped`, else the number of `mappings` that carry a `tutorId`.
    pub fn from_students_response(raw: Value) -> Self {
        let assigned = raw
            .get("totalMapped")
            .and_then(Value::as_u64)
            .unwrap_or_else(|| {
                raw.get("mappings")
                    .and_then(Value::as_array)
                    .map(|mappings| {
                        mappings
                            .iter()
                            .filter(|m| m.get("tutorId").is_some_and(|id| !id.is_null()))
                            .count() as u64
                    })
                    .unwrap_or(0)
            });
        Self {
            kind: AutoMapKind::Students,
            assigned,
            raw,
        }
    }

    /// `mappedCount` when non-zero, else the length of `mapped`.
    pub fn from_applications_response(raw: Value) -> Self {
        let assigned = raw
            .get("mappedCount")
            .and_then(Value::as_u64)
            .filter(|count| *count > 0)
            .unwrap_or_else(|| {
                raw.get("mapped")
                    .and_then(Value::as_array)
                    .map_or(0, |mapped| mapped.len() as u64)
            });
        Self {
            kind: AutoMapKind::Applications,
            assigned,
            raw,
        }
    }

    pub fn title(&self) -> String {
        format!("{} complete", self.kind.label())
    }

    pub fn description(&self) -> String {
        match self.kind {
            AutoMapKind::Students => format!("{} students assigned.", self.assigned),
            AutoMapKind::Applications => format!("{} assignments created.", self.assigned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_students_prefers_total_mapped() {
        let outcome = AutoMapOutcome::from_students_response(json!({ "totalMapped": 4, "mappings": [] }));
        assert_eq!(outcome.assigned, 4);
        assert_eq!(outcome.title(), "Auto-map complete");
        assert_eq!(outcome.description(), "4 students assigned.");
    }

    #[test]
    fn test_students_counts_mappings_with_tutor() {
        let outcome = AutoMapOutcome::from_students_response(json!({
            "mappings": [{ "tutorId": "t1" }, { "tutorId": null }, { "studentId": "s3" }, { "tutorId": "t2" }]
        }));
        assert_eq!(outcome.assigned, 2);
    }

    #[test]
    fn test_applications_falls_back_when_count_is_zero() {
        let outcome =
            AutoMapOutcome::from_applications_response(json!({ "mappedCount": 0, "mapped": [1, 2, 3] }));
        assert_eq!(outcome.assigned, 3);
        assert_eq!(outcome.description(), "3 assignments created.");
        let empty = AutoMapOutcome::from_applications_response(json!({}));
        assert_eq!(empty.assigned, 0);
    }
}
