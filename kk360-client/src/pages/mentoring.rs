use super::{user_message, SEARCH_FILTER};
use crate::api_client::TutoringApi;
use crate::resources::{MentoringSession, SessionStatus};
use kk360_core::{
    CommitOutcome, EntityKey, FilterValue, NotifierPort, ReconcileResult, Reconciler,
};
use std::sync::Arc;

pub struct MentoringPage {
    api: Arc<dyn TutoringApi>,
    state: Reconciler<MentoringSession>,
}

impl MentoringPage {
    pub fn new(api: Arc<dyn TutoringApi>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            api,
            state: Reconciler::new("mentoring sessions", notifier),
        }
    }

    pub fn state(&self) -> &Reconciler<MentoringSession> {
        &self.state
    }

    pub async fn load(&self) -> ReconcileResult<usize> {
        self.state
            .load(|| async {
                self.api
                    .fetch_mentoring_sessions()
                    .await
                    .map(|raw| MentoringSession::list_from_raw(&raw))
                    .map_err(user_message)
            })
            .await
    }

    pub async fn approve(&self, id: &str) -> ReconcileResult<CommitOutcome> {
        self.respond(id, SessionStatus::Approved).await
    }

    pub async fn reject(&self, id: &str) -> ReconcileResult<CommitOutcome> {
        self.respond(id, SessionStatus::Rejected).await
    }

    /// Answer a session request. The server may move the session further
    /// than asked (an approved request comes back scheduled); its answer wins.
    async fn respond(&self, id: &str, status: SessionStatus) -> ReconcileResult<CommitOutcome> {
        let key = EntityKey::new(id);
        let request = async {
            self.api
                .update_mentoring_request(id, status.as_str())
                .await
                .map(|raw| MentoringSession::from_response(&raw))
                .map_err(user_message)
        };
        self.state
            .mutate(&key, move |session: &MentoringSession| session.with_status(status), request)
            .await
    }

    pub async fn cancel(&self, id: &str) -> ReconcileResult<CommitOutcome> {
        let key = EntityKey::new(id);
        let request = async {
            self.api
                .cancel_mentoring_session(id)
                .await
                .map(|raw| MentoringSession::from_response(&raw))
                .map_err(user_message)
        };
        self.state
            .mutate(
                &key,
                |session: &MentoringSession| session.with_status(SessionStatus::Cancelled),
                request,
            )
            .await
    }

    /// Whether the session exists and is in a state that can still be cancelled.
    pub async fn can_cancel(&self, id: &str) -> bool {
        self.state
            .get(&EntityKey::new(id))
            .await
            .is_some_and(|session| session.status.is_cancellable())
    }

    pub async fn set_status_filter(&self, status: &str) {
        self.state.set_filter("status", FilterValue::equals(status)).await;
    }

    pub async fn search(&self, query: &str) {
        self.state
            .set_filter(SEARCH_FILTER, FilterValue::search(query))
            .await;
    }

    pub async fn view(&self) -> Vec<MentoringSession> {
        self.state.view().await
    }
}
