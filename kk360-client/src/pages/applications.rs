use super::{user_message, SEARCH_FILTER};
use crate::api_client::TutoringApi;
use crate::error::ClientResult;
use crate::resources::{Application, ApplicationStatus, DashboardStats};
use kk360_core::{
    CommitOutcome, EntityKey, FilterValue, Notification, NotificationAction, NotifierPort,
    ReconcileResult, Reconciler,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Admin review of scholarship applications.
pub struct ApplicationsPage {
    api: Arc<dyn TutoringApi>,
    state: Reconciler<Application>,
    stats: Mutex<DashboardStats>,
}

impl ApplicationsPage {
    pub fn new(api: Arc<dyn TutoringApi>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            api,
            state: Reconciler::new("applications", notifier),
            stats: Mutex::new(DashboardStats::default()),
        }
    }

    pub fn state(&self) -> &Reconciler<Application> {
        &self.state
    }

    pub async fn load(&self) -> ReconcileResult<usize> {
        self.state
            .load(|| async {
                self.api
                    .fetch_applications()
                    .await
                    .map(|raw| Application::list_from_raw(&raw))
                    .map_err(user_message)
            })
            .await
    }

    /// Refresh the header totals. On failure the previous totals stay.
    pub async fn load_stats(&self) -> ClientResult<DashboardStats> {
        match self.api.fetch_dashboard_stats().await {
            Ok(raw) => {
                let stats = DashboardStats::from_raw(&raw);
                *self.stats.lock().await = stats;
                Ok(stats)
            }
            Err(err) => {
                self.state.notifier().notify(
                    Notification::warning("Could not refresh dashboard stats", err.user_message())
                        .with_action(NotificationAction::Retry),
                );
                Err(err)
            }
        }
    }

    pub async fn stats(&self) -> DashboardStats {
        *self.stats.lock().await
    }

    /// Accepts server or normalized labels; `all` or blank clears the filter.
    pub async fn set_status_filter(&self, status: &str) {
        let value = FilterValue::equals(status);
        let value = if value.is_default() {
            value
        } else {
            FilterValue::equals(ApplicationStatus::normalize(status).as_str())
        };
        self.state.set_filter("status", value).await;
    }

    pub async fn set_class_filter(&self, class: &str) {
        self.state.set_filter("class", FilterValue::equals(class)).await;
    }

    pub async fn search(&self, query: &str) {
        self.state
            .set_filter(SEARCH_FILTER, FilterValue::search(query))
            .await;
    }

    /// Move an application to `status`. The application the server returns
    /// replaces the optimistic one.
    pub async fn update_status(
        &self,
        id: &str,
        status: ApplicationStatus,
        remarks: Option<&str>,
    ) -> ReconcileResult<CommitOutcome> {
        let key = EntityKey::new(id);
        let wire = status.as_wire().to_string();
        let request = async {
            self.api
                .update_application_status(id, &wire, remarks)
                .await
                .map(|raw| raw.get("application").and_then(Application::from_raw))
                .map_err(user_message)
        };
        self.state
            .mutate(&key, move |app: &Application| app.with_status(status.clone()), request)
            .await
    }

    pub async fn status_counts(&self) -> BTreeMap<String, usize> {
        self.state.read(|state| state.count_by("status")).await
    }

    pub async fn classes(&self) -> Vec<String> {
        self.state.facet("class").await
    }

    pub async fn view(&self) -> Vec<Application> {
        self.state.view().await
    }
}
