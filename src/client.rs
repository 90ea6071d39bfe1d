//! Typed client for the newsbrief REST API
//!
//! ```no_run
//! use newsbrief::client::NewsApiClient;
//! use std::time::Duration;
//!
//! # async fn example() -> newsbrief::Result<()> {
//! let client = NewsApiClient::new("http://localhost:8000", Some("secret".into()))?;
//! let submitted = client.summarize_async("Title", "Article text ...", None).await?;
//! let task = client
//!     .wait_for_completion(submitted.task_id, Duration::from_secs(300), Duration::from_secs(5))
//!     .await?;
//! println!("{:?}", task.summary);
//! # Ok(())
//! # }
//! ```

use crate::api::routes::{HealthResponse, SubmitResponse, SummarizeRequest, SyncSummaryResponse};
use crate::error::{ApiError, Error, Result};
use crate::types::{SummaryOverrides, TaskId, TaskSnapshot};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// HTTP client for a running newsbrief server
#[derive(Clone, Debug)]
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl NewsApiClient {
    /// Create a client for `base_url`, sending `api_key` as a bearer token when set
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| Error::Config {
            message: format!("invalid API base URL '{base_url}': {e}"),
            key: Some("base_url".into()),
        })?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("newsbrief-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {e}"),
                key: None,
            })?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse> {
        let request = self.http.get(self.url("health")?);
        self.send(request).await
    }

    /// `POST /summarize`: queue an article and return its task id
    pub async fn summarize_async(
        &self,
        title: &str,
        text: &str,
        config: Option<SummaryOverrides>,
    ) -> Result<SubmitResponse> {
        let body = SummarizeRequest {
            title: title.to_string(),
            text: text.to_string(),
            config,
        };
        let request = self.authorized(self.http.post(self.url("summarize")?).json(&body));
        self.send(request).await
    }

    /// `POST /summarize/sync`: summarize inline
    pub async fn summarize_sync(
        &self,
        title: &str,
        text: &str,
        config: Option<SummaryOverrides>,
    ) -> Result<SyncSummaryResponse> {
        let body = SummarizeRequest {
            title: title.to_string(),
            text: text.to_string(),
            config,
        };
        let request = self.authorized(self.http.post(self.url("summarize/sync")?).json(&body));
        self.send(request).await
    }

    /// `GET /task/{task_id}`
    pub async fn get_task(&self, task_id: TaskId) -> Result<TaskSnapshot> {
        let request = self.authorized(self.http.get(self.url(&format!("task/{task_id}"))?));
        self.send(request).await
    }

    /// Poll a task every `poll_interval` until it is completed or failed
    ///
    /// A failed task is returned as `Ok`; inspect `status` and `error`.
    /// Errors from the server (including 404 and 429) end the wait.
    pub async fn wait_for_completion(
        &self,
        task_id: TaskId,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TaskSnapshot> {
        let poll = async {
            loop {
                let snapshot = self.get_task(task_id).await?;
                if snapshot.status.is_terminal() {
                    return Ok(snapshot);
                }
                tracing::debug!(task_id = %task_id, status = %snapshot.status, "waiting for task");
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            Error::Timeout(format!(
                "task {task_id} did not finish within {}s",
                timeout.as_secs()
            ))
        })?
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Internal(format!("invalid request path '{path}': {e}")))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let raw = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ApiError>(&raw) {
            Ok(body) => (body.error.code, body.error.message),
            Err(_) => (
                "unknown".to_string(),
                status.canonical_reason().unwrap_or("unknown error").to_string(),
            ),
        };
        Err(Error::Remote {
            status: status.as_u16(),
            code,
            message,
        })
    }
}
