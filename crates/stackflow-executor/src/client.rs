//! HTTP executor client
//!
//! Talks JSON to the remote executor. Every call is a single request:
//! no retries are made here, because apply and destroy are not idempotent
//! at the infrastructure level.

use crate::error::{ExecutorError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use stackflow_core::{Executor, ExecutorRequest, ExecutorSession, Plan, State};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Connects to executors over HTTP
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    timeout: Duration,
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl HttpExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Open a session after checking the executor is reachable.
    pub async fn open(&self, endpoint: &str) -> Result<HttpSession> {
        let endpoint = endpoint.trim_end_matches('/').to_string();
        let unavailable = |reason: String| ExecutorError::Unavailable {
            endpoint: endpoint.clone(),
            reason,
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let response = client
            .get(format!("{}/health", endpoint))
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("health check returned {}", response.status())));
        }

        tracing::debug!(endpoint = %endpoint, "Connected to executor");
        Ok(HttpSession {
            client,
            endpoint,
            closed: false,
        })
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn connect(&self, endpoint: &str) -> stackflow_core::Result<Box<dyn ExecutorSession>> {
        Ok(Box::new(self.open(endpoint).await?))
    }
}

/// Envelope of every executor response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

/// An open HTTP session against one executor
#[derive(Debug)]
pub struct HttpSession {
    client: reqwest::Client,
    endpoint: String,
    closed: bool,
}

impl HttpSession {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    async fn call<T: DeserializeOwned>(&self, op: &str, req: &ExecutorRequest) -> Result<Option<T>> {
        if self.closed {
            return Err(ExecutorError::Closed);
        }

        tracing::debug!(
            op,
            content_id = %req.content_id,
            trace_id = %req.trace_id,
            "Calling executor"
        );

        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, op))
            .json(req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let api_response: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(_) if !status.is_success() => {
                return Err(ExecutorError::Remote(format!("{}: {}", status, body.trim())));
            }
            Err(e) => return Err(ExecutorError::InvalidResponse(e.to_string())),
        };

        if !api_response.success || !status.is_success() {
            let message = api_response
                .error
                .unwrap_or_else(|| format!("{} failed with status {}", op, status));
            return Err(ExecutorError::Remote(message));
        }

        Ok(api_response.result)
    }

    fn required<T>(op: &str, result: Option<T>) -> Result<T> {
        result.ok_or_else(|| ExecutorError::InvalidResponse(format!("{} returned no result", op)))
    }
}

#[async_trait]
impl ExecutorSession for HttpSession {
    async fn apply(&mut self, req: &ExecutorRequest) -> stackflow_core::Result<State> {
        let state: Option<State> = self.call("apply", req).await?;
        Ok(Self::required("apply", state)?)
    }

    async fn plan(&mut self, req: &ExecutorRequest) -> stackflow_core::Result<Plan> {
        let plan: Option<Plan> = self.call("plan", req).await?;
        Ok(Self::required("plan", plan)?)
    }

    async fn destroy(&mut self, req: &ExecutorRequest) -> stackflow_core::Result<()> {
        self.call::<serde_json::Value>("destroy", req).await?;
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::debug!(endpoint = %self.endpoint, "Closed executor session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use stackflow_core::StackError;

    async fn apply(Json(req): Json<ExecutorRequest>) -> Json<Value> {
        if req.content.is_empty() {
            return Json(json!({"success": false, "error": "Error: empty configuration"}));
        }
        Json(json!({
            "success": true,
            "result": {"modules": [{"path": ["root"], "outputs": {"vpc": {"value": req.content_id}}}]}
        }))
    }

    async fn plan(Json(_req): Json<ExecutorRequest>) -> Json<Value> {
        Json(json!({
            "success": true,
            "result": {"resources": [{"type": "aws_instance", "name": "web", "action": "create"}]}
        }))
    }

    async fn destroy(Json(_req): Json<ExecutorRequest>) -> (axum::http::StatusCode, String) {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "state is locked".to_string(),
        )
    }

    async fn serve() -> String {
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/apply", post(apply))
            .route("/plan", post(plan))
            .route("/destroy", post(destroy));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_apply_returns_state() {
        let endpoint = serve().await;
        let mut session = HttpExecutor::default().connect(&endpoint).await.unwrap();

        let req = ExecutorRequest::new("alice-aws-g1-cred-1", "trace-1").with_content("{}");
        let state = session.apply(&req).await.unwrap();

        assert_eq!(
            state.root_outputs()["vpc"],
            json!("alice-aws-g1-cred-1")
        );
    }

    #[tokio::test]
    async fn test_remote_failure_is_propagated_verbatim() {
        let endpoint = serve().await;
        let mut session = HttpExecutor::default().connect(&endpoint).await.unwrap();

        let err = session
            .apply(&ExecutorRequest::new("id", "trace"))
            .await
            .unwrap_err();
        assert!(matches!(err, StackError::Execution(ref m) if m == "Error: empty configuration"));

        let err = session
            .destroy(&ExecutorRequest::new("id", "trace"))
            .await
            .unwrap_err();
        assert!(matches!(err, StackError::Execution(ref m) if m.contains("state is locked")));
    }

    #[tokio::test]
    async fn test_plan_returns_resources() {
        let endpoint = serve().await;
        let mut session = HttpExecutor::default().connect(&endpoint).await.unwrap();

        let plan = session
            .plan(&ExecutorRequest::new("id", "trace").with_content("{}"))
            .await
            .unwrap();
        assert_eq!(plan.resources.len(), 1);
        assert_eq!(plan.resources[0].name, "web");
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let endpoint = serve().await;
        let mut session = HttpExecutor::default().open(&endpoint).await.unwrap();

        session.close();
        session.close();

        assert!(session.is_closed());
        let err = ExecutorSession::plan(&mut session, &ExecutorRequest::new("id", "trace"))
            .await
            .unwrap_err();
        assert!(matches!(err, StackError::Connection(_)));
    }

    #[tokio::test]
    async fn test_connect_unreachable() {
        // nothing listens on the discard port
        let err = HttpExecutor::new(Duration::from_secs(2))
            .connect("http://127.0.0.1:9")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StackError::Connection(_)));
    }
}
