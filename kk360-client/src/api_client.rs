//! REST boundary to the KK360 backend.
//!
//! Every call returns the raw JSON body; normalization into view items lives
//! in [`crate::resources`].

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::resources::{AssignmentDraft, AttendanceMark};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::time::Duration;

/// Endpoints the page controllers depend on.
#[async_trait]
pub trait TutoringApi: Send + Sync {
    async fn fetch_applications(&self) -> ClientResult<Value>;

    async fn update_application_status(
        &self,
        id: &str,
        status: &str,
        remarks: Option<&str>,
    ) -> ClientResult<Value>;

    async fn fetch_dashboard_stats(&self) -> ClientResult<Value>;

    async fn fetch_attendance(&self, class_id: &str, date: &str) -> ClientResult<Value>;

    async fn mark_attendance(&self, class_id: &str, marks: &[AttendanceMark]) -> ClientResult<Value>;

    async fn fetch_selected_students(&self) -> ClientResult<Value>;

    async fn fetch_tutor_details(&self) -> ClientResult<Value>;

    async fn fetch_mentoring_sessions(&self) -> ClientResult<Value>;

    async fn update_mentoring_request(&self, id: &str, status: &str) -> ClientResult<Value>;

    async fn cancel_mentoring_session(&self, id: &str) -> ClientResult<Value>;

    async fn run_student_automap(&self, subject: Option<&str>) -> ClientResult<Value>;

    async fn run_application_automap(&self) -> ClientResult<Value>;

    async fn fetch_assignments(&self, class_id: &str) -> ClientResult<Value>;

    async fn create_assignment(&self, draft: &AssignmentDraft) -> ClientResult<Value>;

    async fn update_assignment(&self, id: &str, draft: &AssignmentDraft) -> ClientResult<Value>;

    async fn delete_assignment(&self, id: &str) -> ClientResult<Value>;
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let auth_header = build_auth_headers(config.auth.bearer_token.as_deref())?;
        Ok(Self {
            client,
            base_url: config.api_root(),
            auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<Q>(&self, path: &str, query: Option<&Q>) -> ClientResult<Value>
    where
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(url).headers(self.auth_header.clone());
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn put_json<B>(&self, path: &str, body: &B) -> ClientResult<Value>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .put(url)
            .headers(self.auth_header.clone())
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn post_json<B>(&self, path: &str, body: &B) -> ClientResult<Value>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(url)
            .headers(self.auth_header.clone())
            .json(body)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn delete_json(&self, path: &str) -> ClientResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .delete(url)
            .headers(self.auth_header.clone())
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn parse_response(&self, response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|err| {
                if text.trim_start().starts_with('<') {
                    ClientError::InvalidResponse(text.clone())
                } else {
                    ClientError::Serde(err)
                }
            });
        }
        let message = server_message(&text)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        tracing::debug!(status = status.as_u16(), %message, "request failed");
        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

/// Error text from a failed response: `{message}`, `{error}`, a JSON string,
/// or the raw body.
pub fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(message)) => Some(message),
        Ok(value) => value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Err(_) => Some(trimmed.to_string()),
    }
}

#[async_trait]
impl TutoringApi for RestClient {
    async fn fetch_applications(&self) -> ClientResult<Value> {
        self.get_json::<()>("/admin/applications", None).await
    }

    async fn update_application_status(
        &self,
        id: &str,
        status: &str,
        remarks: Option<&str>,
    ) -> ClientResult<Value> {
        let path = format!("/admin/applications/{id}");
        self.put_json(&path, &json!({ "status": status, "remarks": remarks.unwrap_or("") }))
            .await
    }

    async fn fetch_dashboard_stats(&self) -> ClientResult<Value> {
        self.get_json::<()>("/dashboard/stats", None).await
    }

    async fn fetch_attendance(&self, class_id: &str, date: &str) -> ClientResult<Value> {
        let path = format!("/attendance/{class_id}");
        self.get_json(&path, Some(&[("date", date)])).await
    }

    async fn mark_attendance(&self, class_id: &str, marks: &[AttendanceMark]) -> ClientResult<Value> {
        let path = format!("/attendance/{class_id}");
        self.put_json(&path, &json!({ "attendanceData": marks })).await
    }

    async fn fetch_selected_students(&self) -> ClientResult<Value> {
        self.get_json::<()>("/admin/selected-students", None).await
    }

    async fn fetch_tutor_details(&self) -> ClientResult<Value> {
        self.get_json::<()>("/admin/tutors/details", None).await
    }

    async fn fetch_mentoring_sessions(&self) -> ClientResult<Value> {
        self.get_json::<()>("/mentoring/sessions", None).await
    }

    async fn update_mentoring_request(&self, id: &str, status: &str) -> ClientResult<Value> {
        let path = format!("/mentoring/requests/{id}/status");
        self.put_json(&path, &json!({ "status": status })).await
    }

    async fn cancel_mentoring_session(&self, id: &str) -> ClientResult<Value> {
        let path = format!("/mentoring/{id}/cancel");
        self.put_json(&path, &json!({})).await
    }

    async fn run_student_automap(&self, subject: Option<&str>) -> ClientResult<Value> {
        let body = match subject.map(str::trim).filter(|s| !s.is_empty()) {
            Some(subject) => json!({ "subject": subject }),
            None => json!({}),
        };
        self.post_json("/admin/automap", &body).await
    }

    async fn run_application_automap(&self) -> ClientResult<Value> {
        self.post_json("/admin/applications/automap", &json!({})).await
    }

    async fn fetch_assignments(&self, class_id: &str) -> ClientResult<Value> {
        let path = format!("/assignments/{class_id}");
        self.get_json::<()>(&path, None).await
    }

    async fn create_assignment(&self, draft: &AssignmentDraft) -> ClientResult<Value> {
        self.post_json("/assignments", draft).await
    }

    async fn update_assignment(&self, id: &str, draft: &AssignmentDraft) -> ClientResult<Value> {
        let path = format!("/assignments/{id}");
        self.put_json(&path, draft).await
    }

    async fn delete_assignment(&self, id: &str) -> ClientResult<Value> {
        let path = format!("/assignments/{id}");
        self.delete_json(&path).await
    }
}

fn build_auth_headers(bearer_token: Option<&str>) -> ClientResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(token) = bearer_token {
        let value = format!("Bearer {}", token.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| ClientError::InvalidResponse(e.to_string()))?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_prefers_json_message() {
        assert_eq!(
            server_message(r#"{"message":"Application not found"}"#).as_deref(),
            Some("Application not found")
        );
        assert_eq!(server_message(r#"{"error":"Forbidden"}"#).as_deref(), Some("Forbidden"));
        assert_eq!(server_message(r#""plain json string""#).as_deref(), Some("plain json string"));
        assert_eq!(server_message("<html>502</html>").as_deref(), Some("<html>502</html>"));
        assert_eq!(server_message("   "), None);
        assert_eq!(server_message(r#"{"code":1}"#), None);
    }

    #[test]
    fn test_bearer_header_is_set_when_configured() {
        let headers = build_auth_headers(Some("abc")).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert!(build_auth_headers(None).unwrap().is_empty());
    }
}
