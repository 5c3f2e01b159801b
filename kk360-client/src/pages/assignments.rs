use super::{user_message, SEARCH_FILTER};
use crate::api_client::TutoringApi;
use crate::error::{ClientError, ClientResult};
use crate::resources::{Assignment, AssignmentDraft};
use kk360_core::{
    CommitOutcome, EntityKey, FilterValue, Notification, NotifierPort, ReconcileResult, Reconciler,
};
use std::sync::Arc;

/// A tutor's assignments for the class being viewed.
pub struct AssignmentsPage {
    api: Arc<dyn TutoringApi>,
    state: Reconciler<Assignment>,
}

impl AssignmentsPage {
    pub fn new(api: Arc<dyn TutoringApi>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            api,
            state: Reconciler::new("assignments", notifier),
        }
    }

    pub fn state(&self) -> &Reconciler<Assignment> {
        &self.state
    }

    pub async fn load(&self, class_id: &str) -> ReconcileResult<usize> {
        self.state
            .load(|| async {
                self.api
                    .fetch_assignments(class_id)
                    .await
                    .map(|raw| Assignment::list_from_raw(&raw))
                    .map_err(user_message)
            })
            .await
    }

    /// Create on the server, then add the server's copy. Nothing is shown
    /// before the server has assigned an id.
    pub async fn create(&self, draft: &AssignmentDraft) -> ClientResult<Assignment> {
        let created = self.api.create_assignment(draft).await.and_then(|raw| {
            Assignment::from_response(&raw).ok_or_else(|| {
                ClientError::InvalidResponse("assignment reply without an id".to_string())
            })
        });
        match created {
            Ok(assignment) => {
                tracing::info!(id = %assignment.id, class = %assignment.class_id, "assignment created");
                self.state.upsert(assignment.clone()).await;
                Ok(assignment)
            }
            Err(err) => {
                tracing::warn!(error = %err, "assignment create failed");
                self.state
                    .notifier()
                    .notify(Notification::error("Could not save assignment", err.user_message()));
                Err(err)
            }
        }
    }

    /// Apply the edit locally, then take whatever the server stored.
    pub async fn update(&self, id: &str, draft: &AssignmentDraft) -> ReconcileResult<CommitOutcome> {
        let key = EntityKey::new(id);
        let edit = draft.clone();
        let request = async {
            self.api
                .update_assignment(id, draft)
                .await
                .map(|raw| Assignment::from_response(&raw))
                .map_err(user_message)
        };
        self.state
            .mutate(&key, move |assignment: &Assignment| assignment.with_draft(&edit), request)
            .await
    }

    /// Hide the assignment at once; it comes back if the server refuses.
    pub async fn delete(&self, id: &str) -> ReconcileResult<()> {
        let key = EntityKey::new(id);
        let request = async {
            self.api
                .delete_assignment(id)
                .await
                .map(|_| ())
                .map_err(user_message)
        };
        self.state.remove_with(&key, request).await
    }

    /// `active`, `ended` or `all`.
    pub async fn set_status_filter(&self, status: &str) {
        self.state.set_filter("status", FilterValue::equals(status)).await;
    }

    pub async fn search(&self, query: &str) {
        self.state
            .set_filter(SEARCH_FILTER, FilterValue::search(query))
            .await;
    }

    pub async fn view(&self) -> Vec<Assignment> {
        self.state.view().await
    }
}
