//! Page-level state: one reconciled list per screen plus the calls that
//! feed and mutate it.

mod applications;
mod assignments;
mod attendance;
mod automap;
mod mentoring;
mod roster;

pub use applications::ApplicationsPage;
pub use assignments::AssignmentsPage;
pub use attendance::AttendancePage;
pub use automap::AutoMapTrigger;
pub use mentoring::MentoringPage;
pub use roster::{SelectedStudentsPage, TutorsPage};

use crate::error::ClientError;

/// Filter key used by every page's free-text search box.
pub const SEARCH_FILTER: &str = "search";

/// Errors cross into the reconciler as already-sanitized text.
pub(crate) fn user_message(err: ClientError) -> String {
    err.user_message()
}
