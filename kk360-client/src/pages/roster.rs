//! Read-mostly admin listings: selected students and the tutor directory.

use super::{user_message, SEARCH_FILTER};
use crate::api_client::TutoringApi;
use crate::resources::{group_by_tutor, SelectedStudent, TutorDetail, TutorGroup};
use kk360_core::{FilterValue, NotifierPort, ReconcileResult, Reconciler};
use std::sync::Arc;

pub struct SelectedStudentsPage {
    api: Arc<dyn TutoringApi>,
    state: Reconciler<SelectedStudent>,
}

impl SelectedStudentsPage {
    pub fn new(api: Arc<dyn TutoringApi>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            api,
            state: Reconciler::new("selected students", notifier),
        }
    }

    pub fn state(&self) -> &Reconciler<SelectedStudent> {
        &self.state
    }

    pub async fn load(&self) -> ReconcileResult<usize> {
        self.state
            .load(|| async {
                self.api
                    .fetch_selected_students()
                    .await
                    .map(|raw| SelectedStudent::list_from_raw(&raw))
                    .map_err(user_message)
            })
            .await
    }

    pub async fn set_subject_filter(&self, subject: &str) {
        self.state.set_filter("subject", FilterValue::equals(subject)).await;
    }

    pub async fn set_medium_filter(&self, medium: &str) {
        self.state.set_filter("medium", FilterValue::equals(medium)).await;
    }

    /// Restrict to rows mapped to the tutor with this id.
    pub async fn set_tutor_filter(&self, tutor_id: &str) {
        self.state.set_filter("tutor", FilterValue::equals(tutor_id)).await;
    }

    pub async fn search(&self, query: &str) {
        self.state
            .set_filter(SEARCH_FILTER, FilterValue::search(query))
            .await;
    }

    pub async fn subjects(&self) -> Vec<String> {
        self.state.facet("subject").await
    }

    pub async fn mediums(&self) -> Vec<String> {
        self.state.facet("medium").await
    }

    /// Visible rows grouped by tutor.
    pub async fn by_tutor(&self) -> Vec<TutorGroup> {
        self.state.read(|state| group_by_tutor(state.view())).await
    }

    pub async fn view(&self) -> Vec<SelectedStudent> {
        self.state.view().await
    }
}

pub struct TutorsPage {
    api: Arc<dyn TutoringApi>,
    state: Reconciler<TutorDetail>,
}

impl TutorsPage {
    pub fn new(api: Arc<dyn TutoringApi>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            api,
            state: Reconciler::new("tutors", notifier),
        }
    }

    pub fn state(&self) -> &Reconciler<TutorDetail> {
        &self.state
    }

    pub async fn load(&self) -> ReconcileResult<usize> {
        self.state
            .load(|| async {
                self.api
                    .fetch_tutor_details()
                    .await
                    .map(|raw| TutorDetail::list_from_raw(&raw))
                    .map_err(user_message)
            })
            .await
    }

    pub async fn set_subject_filter(&self, subject: &str) {
        self.state.set_filter("subject", FilterValue::equals(subject)).await;
    }

    pub async fn search(&self, query: &str) {
        self.state
            .set_filter(SEARCH_FILTER, FilterValue::search(query))
            .await;
    }

    pub async fn subjects(&self) -> Vec<String> {
        self.state.facet("subject").await
    }

    pub async fn view(&self) -> Vec<TutorDetail> {
        self.state.view().await
    }
}
