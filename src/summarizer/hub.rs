//! Model hub inference client
//!
//! Speaks the hosted inference wire format: `POST {base}/models/{model}` with
//! `{"inputs": ..., "parameters": {...}}`. Summarization answers with
//! `[{"summary_text": ...}]`; text classification answers with
//! `[[{"label": ..., "score": ...}]]` (some deployments return the flat list).

use crate::config::ModelConfig;
use crate::error::{Error, ModelError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Output length bounds for one summarization call, in model tokens
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryLength {
    /// Upper bound
    pub max_length: usize,
    /// Lower bound
    pub min_length: usize,
}

impl SummaryLength {
    /// Bounds for an article that fits in one chunk
    pub const SINGLE: Self = Self::new(200, 50);
    /// Bounds for each chunk of a multi-chunk article
    pub const CHUNK: Self = Self::new(100, 20);
    /// Bounds for the pass over the joined chunk summaries
    pub const COMBINED: Self = Self::new(250, 100);

    /// Build a length bound
    pub const fn new(max_length: usize, min_length: usize) -> Self {
        Self {
            max_length,
            min_length,
        }
    }
}

/// One sentiment prediction
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Prediction {
    /// Label as reported by the model (e.g. `POSITIVE`)
    pub label: String,
    /// Confidence in `[0, 1]`
    pub score: f32,
}

/// Abstractive summarization model
#[async_trait]
pub trait SummarizationModel: Send + Sync {
    /// Summarize `text` with `model`, bounded by `length`
    async fn summarize(&self, model: &str, text: &str, length: SummaryLength) -> Result<String>;
}

/// Sentiment classification model
#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Highest-scoring label for `text`
    async fn classify(&self, model: &str, text: &str) -> Result<Prediction>;
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    inputs: &'a str,
    parameters: SummarizeParameters,
}

#[derive(Serialize)]
struct SummarizeParameters {
    max_length: usize,
    min_length: usize,
    do_sample: bool,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize)]
struct SummaryText {
    summary_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Nested(Vec<Vec<Prediction>>),
    Flat(Vec<Prediction>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HubErrorMessage {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct HubErrorBody {
    error: HubErrorMessage,
}

/// HTTP client for the model hub
#[derive(Clone, Debug)]
pub struct HubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HubClient {
    /// Build a client from model settings
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("newsbrief/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {e}"),
                key: Some("models".into()),
            })?;

        Ok(Self {
            http,
            base_url: config.hub_url.trim_end_matches('/').to_string(),
            token: config.hub_token.clone(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model.trim_matches('/'))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        model: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        let mut request = self.http.post(self.model_url(model)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<HubErrorBody>(&raw) {
            Ok(HubErrorBody {
                error: HubErrorMessage::One(message),
            }) => message,
            Ok(HubErrorBody {
                error: HubErrorMessage::Many(messages),
            }) => messages.join("; "),
            Err(_) if raw.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => raw.chars().take(200).collect(),
        };

        tracing::warn!(model, status = status.as_u16(), %message, "model hub request failed");
        Err(ModelError::Status {
            model: model.to_string(),
            status: status.as_u16(),
            message,
        }
        .into())
    }
}

#[async_trait]
impl SummarizationModel for HubClient {
    async fn summarize(&self, model: &str, text: &str, length: SummaryLength) -> Result<String> {
        if text.trim().is_empty() {
            return Err(ModelError::EmptyInput {
                model: model.to_string(),
            }
            .into());
        }

        let body = SummarizeRequest {
            inputs: text,
            parameters: SummarizeParameters {
                max_length: length.max_length,
                min_length: length.min_length,
                do_sample: false,
            },
        };

        let started = std::time::Instant::now();
        let response = self.post(model, &body).await?;
        let outputs: Vec<SummaryText> =
            response
                .json()
                .await
                .map_err(|e| ModelError::MalformedResponse {
                    model: model.to_string(),
                    reason: e.to_string(),
                })?;

        let summary = outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or_else(|| ModelError::MalformedResponse {
                model: model.to_string(),
                reason: "empty result list".into(),
            })?;

        tracing::debug!(
            model,
            input_chars = text.len(),
            output_chars = summary.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "summarization call finished"
        );
        Ok(summary)
    }
}

#[async_trait]
impl SentimentModel for HubClient {
    async fn classify(&self, model: &str, text: &str) -> Result<Prediction> {
        if text.trim().is_empty() {
            return Err(ModelError::EmptyInput {
                model: model.to_string(),
            }
            .into());
        }

        let response = self.post(model, &ClassifyRequest { inputs: text }).await?;
        let parsed: ClassifyResponse =
            response
                .json()
                .await
                .map_err(|e| ModelError::MalformedResponse {
                    model: model.to_string(),
                    reason: e.to_string(),
                })?;

        let predictions = match parsed {
            ClassifyResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            ClassifyResponse::Flat(predictions) => predictions,
        };

        predictions
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or_else(|| {
                ModelError::MalformedResponse {
                    model: model.to_string(),
                    reason: "no predictions".into(),
                }
                .into()
            })
    }
}
