use super::{user_message, SEARCH_FILTER};
use crate::api_client::TutoringApi;
use crate::resources::{AttendanceEntry, AttendanceMark, AttendanceStatus, AttendanceSummary};
use kk360_core::{
    BulkReport, CommitOutcome, EntityKey, FilterValue, Keyed, NotifierPort, ReconcileResult,
    Reconciler,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Attendance sheet for one class on one date.
pub struct AttendancePage {
    api: Arc<dyn TutoringApi>,
    class_id: String,
    date: String,
    state: Reconciler<AttendanceEntry>,
}

impl AttendancePage {
    pub fn new(
        api: Arc<dyn TutoringApi>,
        notifier: Arc<dyn NotifierPort>,
        class_id: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            api,
            class_id: class_id.into(),
            date: date.into(),
            state: Reconciler::new("attendance", notifier),
        }
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn state(&self) -> &Reconciler<AttendanceEntry> {
        &self.state
    }

    pub async fn load(&self) -> ReconcileResult<usize> {
        self.state
            .load(|| async {
                self.api
                    .fetch_attendance(&self.class_id, &self.date)
                    .await
                    .map(|raw| AttendanceEntry::list_from_raw(&raw, &self.class_id))
                    .map_err(user_message)
            })
            .await
    }

    /// Mark one student. The server does not echo the row back, so the
    /// optimistic value stands on success.
    pub async fn mark(
        &self,
        student_id: &str,
        status: AttendanceStatus,
    ) -> ReconcileResult<CommitOutcome> {
        let key = AttendanceEntry::key_for(student_id);
        let marks = [AttendanceMark {
            student_id: student_id.to_string(),
            status,
        }];
        let request = async {
            self.api
                .mark_attendance(&self.class_id, &marks)
                .await
                .map(|_| None)
                .map_err(user_message)
        };
        self.state
            .mutate(&key, move |entry: &AttendanceEntry| entry.with_status(status), request)
            .await
    }

    /// Mark every visible student, one request each, so a failure only
    /// reverts that student.
    pub async fn mark_all(&self, status: AttendanceStatus) -> BulkReport {
        let visible: Vec<(EntityKey, String)> = self
            .state
            .read(|state| {
                state
                    .view()
                    .map(|entry| (entry.key(), entry.student_id.clone()))
                    .collect()
            })
            .await;
        let keys: Vec<EntityKey> = visible.iter().map(|(key, _)| key.clone()).collect();
        let student_ids: HashMap<EntityKey, String> = visible.into_iter().collect();

        self.state
            .bulk_mutate(
                &keys,
                move |entry: &AttendanceEntry| entry.with_status(status),
                |key: EntityKey| {
                    let marks = [AttendanceMark {
                        student_id: student_ids.get(&key).cloned().unwrap_or_default(),
                        status,
                    }];
                    async move {
                        self.api
                            .mark_attendance(&self.class_id, &marks)
                            .await
                            .map(|_| None)
                            .map_err(user_message)
                    }
                },
            )
            .await
    }

    pub async fn set_status_filter(&self, status: &str) {
        self.state.set_filter("status", FilterValue::equals(status)).await;
    }

    pub async fn search(&self, query: &str) {
        self.state
            .set_filter(SEARCH_FILTER, FilterValue::search(query))
            .await;
    }

    /// Totals over the whole roster, ignoring filters.
    pub async fn summary(&self) -> AttendanceSummary {
        self.state
            .read(|state| AttendanceSummary::from_entries(state.items()))
            .await
    }

    pub async fn view(&self) -> Vec<AttendanceEntry> {
        self.state.view().await
    }
}
