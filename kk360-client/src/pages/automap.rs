use crate::api_client::TutoringApi;
use crate::error::{ClientError, ClientResult};
use crate::resources::{AutoMapKind, AutoMapOutcome};
use kk360_core::error::MARKUP_FALLBACK;
use kk360_core::{Notification, NotifierPort};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runs the server's tutor auto-mapping. Only one run at a time.
pub struct AutoMapTrigger {
    api: Arc<dyn TutoringApi>,
    notifier: Arc<dyn NotifierPort>,
    running: AtomicBool,
}

/// Clears the running flag even if the caller drops the future mid-request.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AutoMapTrigger {
    pub fn new(api: Arc<dyn TutoringApi>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            api,
            notifier,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Map selected students to tutors, optionally for one subject only.
    pub async fn run_students(&self, subject: Option<&str>) -> ClientResult<AutoMapOutcome> {
        let _guard = self.begin()?;
        let result = self.api.run_student_automap(subject).await;
        self.finish(AutoMapKind::Students, result)
    }

    pub async fn run_applications(&self) -> ClientResult<AutoMapOutcome> {
        let _guard = self.begin()?;
        let result = self.api.run_application_automap().await;
        self.finish(AutoMapKind::Applications, result)
    }

    fn begin(&self) -> ClientResult<RunGuard<'_>> {
        if self.running.swap(true, Ordering::AcqRel) {
            tracing::debug!("auto-map already running, ignoring trigger");
            return Err(ClientError::Busy("auto-map"));
        }
        Ok(RunGuard(&self.running))
    }

    fn finish(
        &self,
        kind: AutoMapKind,
        result: ClientResult<serde_json::Value>,
    ) -> ClientResult<AutoMapOutcome> {
        match result {
            Ok(raw) => {
                let outcome = match kind {
                    AutoMapKind::Students => AutoMapOutcome::from_students_response(raw),
                    AutoMapKind::Applications => AutoMapOutcome::from_applications_response(raw),
                };
                tracing::info!(kind = kind.label(), assigned = outcome.assigned, "auto-map finished");
                self.notifier
                    .notify(Notification::success(outcome.title(), outcome.description()));
                Ok(outcome)
            }
            Err(err) => {
                let message = err.user_message();
                let title = if message == MARKUP_FALLBACK {
                    format!("{} error", kind.label())
                } else {
                    format!("{} failed", kind.label())
                };
                tracing::warn!(kind = kind.label(), error = %err, "auto-map failed");
                self.notifier.notify(Notification::error(title, message));
                Err(err)
            }
        }
    }
}
