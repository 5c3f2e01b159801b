//! Tutor directory entries.

use super::{names, normalize_list, text, text_or_empty};
use kk360_core::{EntityKey, Filterable, Keyed};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetLink {
    pub class_id: String,
    pub title: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorDetail {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subjects: Vec<String>,
    pub qualifications: String,
    pub classes: Vec<String>,
    pub meet_links: Vec<MeetLink>,
}

impl TutorDetail {
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let meet_links = raw
            .get("meetLinks")
            .and_then(Value::as_array)
            .map(|links| {
                links
                    .iter()
                    .map(|link| MeetLink {
                        class_id: text_or_empty(link, &["classId", "_id"]),
                        title: text_or_empty(link, &["title"]),
                        link: text(link, &["link", "meetLink"]),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            id: text(raw, &["id", "_id"])?,
            name: text_or_empty(raw, &["name", "user.name"]),
            email: text_or_empty(raw, &["email", "user.email"]),
            phone: text_or_empty(raw, &["phone", "user.phone"]),
            subjects: names(raw.get("subjects")),
            qualifications: text_or_empty(raw, &["qualifications"]),
            classes: names(raw.get("classes")),
            meet_links,
        })
    }

    pub fn list_from_raw(payload: &Value) -> Vec<Self> {
        normalize_list(payload, "tutors", Self::from_raw)
    }

    /// Classes that currently have a meet link set.
    pub fn active_meet_links(&self) -> usize {
        self.meet_links.iter().filter(|l| l.link.is_some()).count()
    }
}

impl Keyed for TutorDetail {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.clone())
    }
}

impl Filterable for TutorDetail {
    fn field_values(&self, field: &str) -> Vec<&str> {
        match field {
            "subject" => self.subjects.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.email.as_str(),
            self.qualifications.as_str(),
        ]
    }
}
