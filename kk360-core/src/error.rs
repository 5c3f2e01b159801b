//! Error types for list state reconciliation

use crate::identity::EntityKey;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Shown instead of an error body that looks like an HTML page.
pub const MARKUP_FALLBACK: &str =
    "The server returned an unexpected page (possible expired session or server error). Please try again.";

/// Shown when the server gave no usable message.
pub const GENERIC_FALLBACK: &str = "Something went wrong. Please try again.";

/// Longest message surfaced to the user, in characters.
pub const MAX_MESSAGE_CHARS: usize = 280;

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*<").expect("valid markup regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Error kinds, independent of which operation produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FetchFailed,
    MutationRejected,
    StaleResponse,
    PreconditionViolation,
}

/// Reconciliation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Failed to load {resource}: {message}")]
    FetchFailed { resource: String, message: String },

    #[error("{message}")]
    MutationRejected { key: EntityKey, message: String },

    #[error("Discarded stale load #{sequence} for {resource} (already applied #{applied})")]
    StaleLoad {
        resource: String,
        sequence: u64,
        applied: u64,
    },

    #[error("Discarded commit for {key}: no mutation in flight")]
    StaleCommit { key: EntityKey },

    #[error("No {resource} item with key {key}")]
    MissingItem { resource: String, key: EntityKey },

    #[error("A change to {key} is already in flight")]
    MutationInFlight { key: EntityKey },

    #[error("Patch for {key} changed its identity to {changed_to}")]
    IdentityChanged { key: EntityKey, changed_to: EntityKey },
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FetchFailed { .. } => ErrorKind::FetchFailed,
            Self::MutationRejected { .. } => ErrorKind::MutationRejected,
            Self::StaleLoad { .. } | Self::StaleCommit { .. } => ErrorKind::StaleResponse,
            Self::MissingItem { .. } | Self::MutationInFlight { .. } | Self::IdentityChanged { .. } => {
                ErrorKind::PreconditionViolation
            }
        }
    }

    /// Error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FetchFailed { .. } => "FETCH_FAILED",
            Self::MutationRejected { .. } => "MUTATION_REJECTED",
            Self::StaleLoad { .. } => "STALE_LOAD",
            Self::StaleCommit { .. } => "STALE_COMMIT",
            Self::MissingItem { .. } => "MISSING_ITEM",
            Self::MutationInFlight { .. } => "MUTATION_IN_FLIGHT",
            Self::IdentityChanged { .. } => "IDENTITY_CHANGED",
        }
    }

    /// Whether the user should be told. Stale responses and precondition
    /// violations are harmless UI races.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::FetchFailed | ErrorKind::MutationRejected
        )
    }

    /// Short human-readable text for a notification body.
    pub fn user_message(&self) -> String {
        match self {
            Self::FetchFailed { message, .. } | Self::MutationRejected { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Turn a raw server error payload into something safe to show.
///
/// Markup bodies (an HTML error page behind a proxy or auth redirect) are
/// replaced with [`MARKUP_FALLBACK`]; blank bodies with [`GENERIC_FALLBACK`].
pub fn user_facing_message(raw: &str) -> String {
    if MARKUP.is_match(raw) {
        return MARKUP_FALLBACK.to_string();
    }
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    if collapsed.is_empty() {
        return GENERIC_FALLBACK.to_string();
    }
    if collapsed.chars().count() > MAX_MESSAGE_CHARS {
        let mut truncated: String = collapsed.chars().take(MAX_MESSAGE_CHARS - 1).collect();
        truncated.push('…');
        return truncated;
    }
    collapsed.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_is_replaced() {
        let html = "  <!DOCTYPE html><html><body>502 Bad Gateway</body></html>";
        assert_eq!(user_facing_message(html), MARKUP_FALLBACK);
        assert_eq!(user_facing_message("<h1>Error</h1>"), MARKUP_FALLBACK);
    }

    #[test]
    fn test_plain_message_is_kept() {
        assert_eq!(
            user_facing_message("Application not found"),
            "Application not found"
        );
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(user_facing_message("  Server\n  Error  "), "Server Error");
    }

    #[test]
    fn test_blank_uses_generic_fallback() {
        assert_eq!(user_facing_message("   "), GENERIC_FALLBACK);
    }

    #[test]
    fn test_long_message_is_truncated() {
        let long = "x".repeat(1000);
        let message = user_facing_message(&long);
        assert_eq!(message.chars().count(), MAX_MESSAGE_CHARS);
        assert!(message.ends_with('…'));
    }

    #[test]
    fn test_kinds_and_visibility() {
        let stale = ReconcileError::StaleCommit {
            key: EntityKey::new("k"),
        };
        assert_eq!(stale.kind(), ErrorKind::StaleResponse);
        assert!(!stale.is_user_visible());

        let in_flight = ReconcileError::MutationInFlight {
            key: EntityKey::new("k"),
        };
        assert_eq!(in_flight.kind(), ErrorKind::PreconditionViolation);
        assert!(!in_flight.is_user_visible());

        let rejected = ReconcileError::MutationRejected {
            key: EntityKey::new("k"),
            message: "Server Error".to_string(),
        };
        assert_eq!(rejected.kind(), ErrorKind::MutationRejected);
        assert!(rejected.is_user_visible());
        assert_eq!(rejected.user_message(), "Server Error");
        assert_eq!(rejected.error_code(), "MUTATION_REJECTED");
    }
}
