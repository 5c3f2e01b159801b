//! Identity keys used to match the same entity across fetches and mutations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator used when joining composite key parts.
pub const COMPOSITE_SEPARATOR: char = ':';

/// Stable, immutable identity of an entity as a primitive string.
///
/// Keys are already extracted from whatever nested id field the server used
/// (`_id`, `id`, or a combination such as `applicationId+subject+medium`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build a key from several parts, e.g. `["app-1", "Maths", "English"]`
    /// becomes `app-1:Maths:English`.
    pub fn composite<S: AsRef<str>>(parts: &[S]) -> Self {
        let mut joined = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                joined.push(COMPOSITE_SEPARATOR);
            }
            joined.push_str(part.as_ref());
        }
        Self(joined)
    }

    /// Build a key scoped to a resource namespace, e.g. `attendance:s1`.
    pub fn scoped(namespace: &str, id: &str) -> Self {
        Self::composite(&[namespace, id])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for EntityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Anything with a stable identity key.
pub trait Keyed {
    fn key(&self) -> EntityKey;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_joins_parts() {
        let key = EntityKey::composite(&["app-1", "Maths", "Tamil"]);
        assert_eq!(key.as_str(), "app-1:Maths:Tamil");
    }

    #[test]
    fn test_composite_key_single_part() {
        let key = EntityKey::composite(&["only"]);
        assert_eq!(key.as_str(), "only");
    }

    #[test]
    fn test_scoped_key() {
        let key = EntityKey::scoped("attendance", "studentId123");
        assert_eq!(key.to_string(), "attendance:studentId123");
    }

    #[test]
    fn test_key_serializes_as_plain_string() {
        let key = EntityKey::new("abc");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
