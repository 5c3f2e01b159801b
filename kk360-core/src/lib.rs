//! KK360 Core - List State Reconciliation
//!
//! Keeps server-authoritative collections (applications, attendance, mentoring
//! sessions, tutors) consistent with local view state across asynchronous
//! mutations. No I/O lives here: fetches and mutating requests are supplied by
//! the caller as futures or results.

pub mod error;
pub mod filter;
pub mod identity;
pub mod list_state;
pub mod notify;
pub mod reconciler;

pub use error::{user_facing_message, ErrorKind, ReconcileError, ReconcileResult};
pub use filter::{FilterSet, FilterValue, Filterable};
pub use identity::{EntityKey, Keyed};
pub use list_state::{BulkApplied, CommitOutcome, ListState, LoadTicket, Patch, Removal};
pub use notify::{
    Notification, NotificationAction, NotificationLevel, NotifierPort, RecordingNotifier,
    TracingNotifier,
};
pub use reconciler::{BulkReport, Reconciler};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// An item that can live in a [`ListState`].
///
/// Blanket-implemented for anything with an identity key and declared filter
/// fields.
pub trait Record: Keyed + Filterable + Clone + Send + Sync + 'static {}

impl<T> Record for T where T: Keyed + Filterable + Clone + Send + Sync + 'static {}
