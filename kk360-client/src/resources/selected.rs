//! Selected students, one row per application, subject and medium.

use super::{normalize_list, text, text_or_empty};
use kk360_core::{EntityKey, Filterable, Keyed};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TutorRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStudent {
    pub application_id: String,
    pub name: String,
    pub subject: String,
    pub medium: String,
    pub tutors: Vec<TutorRef>,
}

impl SelectedStudent {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let application_id = text(raw, &["applicationId", "applicationNumber", "_id"])?;
        let tutors = raw
            .get("tutors")
            .and_then(Value::as_array)
            .map(|tutors| {
                tutors
                    .iter()
                    .filter_map(|tutor| {
                        Some(TutorRef {
                            id: text(tutor, &["id", "_id"])?,
                            name: text_or_empty(tutor, &["name", "user.name"]),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            application_id,
            name: text_or_empty(raw, &["name", "personalInfo.fullName"]),
            subject: text_or_empty(raw, &["subject"]),
            medium: text_or_empty(raw, &["medium"]),
            tutors,
        })
    }

    pub fn list_from_raw(payload: &Value) -> Vec<Self> {
        normalize_list(payload, "rows", Self::from_raw)
    }

    pub fn is_mapped(&self) -> bool {
        !self.tutors.is_empty()
    }
}

impl Keyed for SelectedStudent {
    fn key(&self) -> EntityKey {
        EntityKey::composite(&[&self.application_id, &self.subject, &self.medium])
    }
}

impl Filterable for SelectedStudent {
    fn field_values(&self, field: &str) -> Vec<&str> {
        match field {
            "subject" => vec![self.subject.as_str()],
            "medium" => vec![self.medium.as_str()],
            "tutor" => self.tutors.iter().map(|t| t.id.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.application_id.as_str()]
    }
}

/// Students assigned to one tutor; `tutor` is `None` for the unmapped bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorGroup {
    pub tutor: Option<TutorRef>,
    pub students: Vec<SelectedStudent>,
}

/// Group rows by tutor, ordered by tutor name, unmapped rows last.
///
/// A row mapped to several tutors appears under each of them.
pub fn group_by_tutor<'a>(rows: impl IntoIterator<Item = &'a SelectedStudent>) -> Vec<TutorGroup> {
    let mut groups: BTreeMap<(String, String), TutorGroup> = BTreeMap::new();
    let mut unmapped = Vec::new();
    for row in rows {
        if !row.is_mapped() {
            unmapped.push(row.clone());
            continue;
        }
        for tutor in &row.tutors {
            groups
                .entry((tutor.name.clone(), tutor.id.clone()))
                .or_insert_with(|| TutorGroup {
                    tutor: Some(tutor.clone()),
                    students: Vec::new(),
                })
                .students
                .push(row.clone());
        }
    }
    let mut result: Vec<TutorGroup> = groups.into_values().collect();
    if !unmapped.is_empty() {
        result.push(TutorGroup {
            tutor: None,
            students: unmapped,
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<SelectedStudent> {
        SelectedStudent::list_from_raw(&json!({ "rows": [
            { "applicationId": "APP-1", "name": "Ravi", "subject": "Maths", "medium": "Tamil",
              "tutors": [{ "id": "t2", "name": "Vani" }] },
            { "applicationId": "APP-1", "name": "Ravi", "subject": "Science", "medium": "Tamil",
              "tutors": [] },
            { "applicationId": "APP-2", "name": "Kavya", "subject": "Maths", "medium": "English",
              "tutors": [{ "id": "t1", "name": "Arun" }, { "id": "t2", "name": "Vani" }] }
        ]}))
    }

    #[test]
    fn test_composite_key_distinguishes_subjects() {
        let rows = rows();
        assert_eq!(rows[0].key().as_str(), "APP-1:Maths:Tamil");
        assert_ne!(rows[0].key(), rows[1].key());
    }

    #[test]
    fn test_groups_by_tutor_name_with_unmapped_last() {
        let rows = rows();
        let groups = group_by_tutor(&rows);
        let names: Vec<Option<&str>> = groups
            .iter()
            .map(|g| g.tutor.as_ref().map(|t| t.name.as_str()))
            .collect();
        assert_eq!(names, vec![Some("Arun"), Some("Vani"), None]);
        assert_eq!(groups[1].students.len(), 2);
        assert_eq!(groups[2].students[0].subject, "Science");
    }
}
