use std::time::Duration;

use async_trait::async_trait;
use flowsmith_core_types::{RemoteTaskId, TaskStatus};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::TaskRunnerError;
use crate::model::{TaskHandle, TaskRequest, TaskSnapshot};
use crate::TaskRunner;

#[derive(Debug, Clone)]
pub struct SkyvernConfig {
    pub api_key: String,
    pub base_url: String,
    pub proxy_location: Option<String>,
    pub request_timeout: Duration,
}

impl Default for SkyvernConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.skyvern.com/api/v1".to_string(),
            proxy_location: Some("RESIDENTIAL".to_string()),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP client for a Skyvern-compatible task runner (`POST /tasks`, `GET /tasks/{id}`).
pub struct SkyvernClient {
    client: Client,
    config: SkyvernConfig,
}

impl SkyvernClient {
    pub fn new(config: SkyvernConfig) -> Result<Self, TaskRunnerError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| {
                TaskRunnerError::Transport(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TaskRunnerError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response unavailable>".to_string());
        Err(TaskRunnerError::Backend { status, body })
    }
}

#[derive(Debug, Serialize)]
struct CreateTaskBody<'a> {
    url: &'a str,
    navigation_goal: &'a str,
    data_extraction_goal: &'a str,
    navigation_payload: &'a serde_json::Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy_location: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct TaskStatusResponse {
    #[serde(default)]
    task_id: Option<String>,
    status: String,
    #[serde(default)]
    extracted_information: Option<Value>,
    #[serde(default)]
    failure_reason: Option<String>,
}

#[async_trait]
impl TaskRunner for SkyvernClient {
    async fn dispatch(&self, request: &TaskRequest) -> Result<TaskHandle, TaskRunnerError> {
        let body = CreateTaskBody {
            url: &request.url,
            navigation_goal: &request.navigation_goal,
            data_extraction_goal: &request.data_extraction_goal,
            navigation_payload: &request.inputs,
            proxy_location: self.config.proxy_location.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint("tasks/"))
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| TaskRunnerError::Transport(err.to_string()))?;

        let created: CreateTaskResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| TaskRunnerError::invalid_response(format!("create task: {err}")))?;

        info!(task_id = %created.task_id, url = %request.url, "dispatched remote task");
        Ok(TaskHandle::new(created.task_id))
    }

    async fn poll(&self, handle: &TaskHandle) -> Result<TaskSnapshot, TaskRunnerError> {
        let response = self
            .client
            .get(self.endpoint(&format!("tasks/{}", handle.task_id)))
            .header("x-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|err| TaskRunnerError::Transport(err.to_string()))?;

        let payload: TaskStatusResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| TaskRunnerError::invalid_response(format!("task status: {err}")))?;

        let status: TaskStatus = payload
            .status
            .parse()
            .map_err(|err| TaskRunnerError::invalid_response(format!("{err}")))?;
        debug!(task_id = %handle.task_id, %status, "polled remote task");

        let task_id = payload
            .task_id
            .map(RemoteTaskId::from)
            .unwrap_or_else(|| handle.task_id.clone());
        let mut snapshot =
            TaskSnapshot::new(task_id, status).with_extracted(payload.extracted_information);
        if let Some(reason) = payload.failure_reason {
            snapshot = snapshot.with_failure_reason(reason);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsmith_core_types::Inputs;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(server: &Server) -> SkyvernClient {
        SkyvernClient::new(SkyvernConfig {
            api_key: "sk-test".to_string(),
            base_url: server.url(),
            ..SkyvernConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn dispatch_sends_normalized_url_and_credential() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks/")
            .match_header("x-api-key", "sk-test")
            .match_body(Matcher::PartialJson(json!({
                "url": "https://example.com",
                "navigation_goal": "open menu",
                "navigation_payload": {"party_size": 2},
                "proxy_location": "RESIDENTIAL"
            })))
            .with_status(200)
            .with_body(r#"{"task_id": "tsk_42"}"#)
            .create_async()
            .await;

        let mut inputs = Inputs::new();
        inputs.insert("party_size".to_string(), json!(2));
        let request = TaskRequest::new("example.com", "open menu", "", inputs);
        let handle = client_for(&server).dispatch(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(handle.task_id.as_str(), "tsk_42");
    }

    #[tokio::test]
    async fn http_urls_are_sent_unchanged() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks/")
            .match_body(Matcher::PartialJson(json!({"url": "http://x"})))
            .with_status(200)
            .with_body(r#"{"task_id": "tsk_1"}"#)
            .create_async()
            .await;

        let request = TaskRequest::new("http://x", "nav", "extract", Inputs::new());
        client_for(&server).dispatch(&request).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn poll_defaults_missing_extraction() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/tasks/tsk_7")
            .match_header("x-api-key", "sk-test")
            .with_status(200)
            .with_body(r#"{"task_id": "tsk_7", "status": "completed"}"#)
            .create_async()
            .await;

        let snapshot = client_for(&server)
            .poll(&TaskHandle::new("tsk_7"))
            .await
            .unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed);
        assert!(snapshot.extracted_information.is_empty());
    }

    #[tokio::test]
    async fn poll_reports_failure_reason() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/tasks/tsk_8")
            .with_status(200)
            .with_body(
                r#"{"status": "failed", "failure_reason": "captcha", "extracted_information": null}"#,
            )
            .create_async()
            .await;

        let snapshot = client_for(&server)
            .poll(&TaskHandle::new("tsk_8"))
            .await
            .unwrap();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert_eq!(snapshot.failure_reason.as_deref(), Some("captcha"));
        assert_eq!(snapshot.task_id.as_str(), "tsk_8");
    }

    #[tokio::test]
    async fn unknown_status_is_invalid_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/tasks/tsk_9")
            .with_status(200)
            .with_body(r#"{"status": "exploded"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .poll(&TaskHandle::new("tsk_9"))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskRunnerError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn backend_error_surfaces_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/tasks/")
            .with_status(401)
            .with_body("bad key")
            .create_async()
            .await;

        let request = TaskRequest::new("example.com", "nav", "extract", Inputs::new());
        let err = client_for(&server).dispatch(&request).await.unwrap_err();
        assert!(matches!(err, TaskRunnerError::Backend { status: 401, .. }));
    }
}
