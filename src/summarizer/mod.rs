//! Article summarization
//!
//! [`ArticleSummarizer`] is the seam between the task machinery and whatever
//! produces summaries. [`NewsSummarizer`] is the shipped implementation: it
//! cleans the article, condenses it with a hosted summarization model
//! ([`hub`]), classifies the story ([`text`]) and renders the styled output
//! ([`style`]).

pub mod hub;
pub mod style;
pub mod text;

use crate::config::{Config, SummaryConfig};
use crate::error::{Error, Result};
use crate::types::{Summary, SummaryOverrides};
use async_trait::async_trait;
use hub::{HubClient, SentimentModel, SummarizationModel, SummaryLength};
use std::sync::Arc;
use text::{Sentiment, StoryContext};

/// Longest fallback excerpt when the model cannot summarize a whole article
const FALLBACK_SUMMARY_CHARS: usize = 500;
/// Longest fallback excerpt for a single chunk
const FALLBACK_CHUNK_CHARS: usize = 200;
/// Characters of cleaned text sent to the sentiment classifier
const SENTIMENT_INPUT_CHARS: usize = 2000;
/// Classifier confidence needed to override a neutral keyword verdict
const SENTIMENT_MIN_SCORE: f32 = 0.75;

/// Produces a [`Summary`] for one article
#[async_trait]
pub trait ArticleSummarizer: Send + Sync {
    /// Summarize `text` titled `title`, applying per-request `overrides`
    async fn summarize(
        &self,
        title: &str,
        text: &str,
        overrides: &SummaryOverrides,
    ) -> Result<Summary>;

    /// Whether the summarizer can accept work
    fn is_ready(&self) -> bool {
        true
    }
}

/// Model-backed news summarizer
pub struct NewsSummarizer {
    config: SummaryConfig,
    model: Arc<dyn SummarizationModel>,
    sentiment: Option<(String, Arc<dyn SentimentModel>)>,
}

impl std::fmt::Debug for NewsSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsSummarizer")
            .field("config", &self.config)
            .field(
                "sentiment_model",
                &self.sentiment.as_ref().map(|(name, _)| name),
            )
            .finish_non_exhaustive()
    }
}

impl NewsSummarizer {
    /// Build a summarizer that talks to the model hub configured in `config`
    pub fn new(config: &Config) -> Result<Self> {
        config
            .summary
            .validate()
            .map_err(|(key, message)| Error::Config {
                message,
                key: Some(format!("summary.{key}")),
            })?;

        let hub = Arc::new(HubClient::new(&config.models)?);
        tracing::info!(
            hub = hub.base_url(),
            model = %config.summary.model_name,
            sentiment_model = config.models.sentiment_model.as_deref().unwrap_or("none"),
            "summarizer configured"
        );

        let sentiment = config
            .models
            .sentiment_model
            .clone()
            .map(|name| (name, hub.clone() as Arc<dyn SentimentModel>));
        Ok(Self {
            config: config.summary.clone(),
            model: hub,
            sentiment,
        })
    }

    /// Build a summarizer over explicit model implementations
    pub fn with_models(
        config: SummaryConfig,
        model: Arc<dyn SummarizationModel>,
        sentiment: Option<(String, Arc<dyn SentimentModel>)>,
    ) -> Self {
        Self {
            config,
            model,
            sentiment,
        }
    }

    /// Default summary settings
    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Summarize with the default settings
    pub async fn summarize_article(&self, title: &str, text: &str) -> Result<Summary> {
        self.summarize_with(title, text, &self.config).await
    }

    /// Summarize with explicit settings
    pub async fn summarize_with(
        &self,
        title: &str,
        text: &str,
        config: &SummaryConfig,
    ) -> Result<Summary> {
        let cleaned = text::clean_text(text);
        if cleaned.is_empty() {
            return Err(Error::validation(
                "text",
                "article text is empty after cleaning",
            ));
        }

        let base = self.base_summary(&cleaned, config).await?;
        let key_data = text::extract_key_data(&cleaned);
        let context = self
            .refine_sentiment(&cleaned, text::analyze_story_context(&cleaned, &base))
            .await;
        tracing::debug!(
            story_type = ?context.story_type,
            sentiment = ?context.sentiment,
            prices = ?key_data.prices,
            percentages = ?key_data.percentages,
            tickers = ?key_data.tickers,
            "article analyzed"
        );

        let hashtags = style::generate_hashtags(&cleaned, config.min_hashtags, config.max_hashtags);
        let title_source = if base.trim().is_empty() {
            title
        } else {
            base.as_str()
        };
        let short_title = style::generate_short_title(title_source, config.max_title_words);
        let paragraph = {
            let mut rng = rand::thread_rng();
            style::journalistic_paragraph(&cleaned, &base, context, &mut rng)
        };

        Ok(Summary {
            title: short_title,
            paragraph,
            hashtags: hashtags.join(" "),
        })
    }

    /// Condense `text` with the summarization model
    ///
    /// Short articles are summarized in one call. Longer ones are chunked,
    /// each chunk summarized, and the joined chunk summaries summarized once
    /// more if they fit the token budget. A model that answers with an error
    /// degrades to truncated source text; an unreachable hub is an error.
    async fn base_summary(&self, text: &str, config: &SummaryConfig) -> Result<String> {
        let model = config.model_name.as_str();
        let chunks = text::chunk_text(text, config.max_chunk_tokens);

        match chunks.as_slice() {
            [] => Ok(String::new()),
            [only] => {
                let result = self.model.summarize(model, only, SummaryLength::SINGLE).await;
                degrade(result, only, FALLBACK_SUMMARY_CHARS, "single chunk")
            }
            _ => {
                tracing::debug!(model, chunks = chunks.len(), "summarizing in chunks");
                let mut partials = Vec::with_capacity(chunks.len());
                for chunk in &chunks {
                    let result = self.model.summarize(model, chunk, SummaryLength::CHUNK).await;
                    partials.push(degrade(result, chunk, FALLBACK_CHUNK_CHARS, "chunk")?);
                }

                let combined = partials.join(" ");
                if text::estimate_tokens(&combined) > config.max_chunk_tokens {
                    return Ok(text::truncate_chars(&combined, FALLBACK_SUMMARY_CHARS).to_string());
                }
                let result = self
                    .model
                    .summarize(model, &combined, SummaryLength::COMBINED)
                    .await;
                degrade(result, &combined, FALLBACK_SUMMARY_CHARS, "combined summary")
            }
        }
    }

    async fn refine_sentiment(&self, text: &str, context: StoryContext) -> StoryContext {
        let Some((model, classifier)) = &self.sentiment else {
            return context;
        };
        if context.sentiment != Sentiment::Neutral {
            return context;
        }

        let input = text::truncate_chars(text, SENTIMENT_INPUT_CHARS);
        match classifier.classify(model, input).await {
            Ok(prediction) if prediction.score >= SENTIMENT_MIN_SCORE => {
                match Sentiment::from_label(&prediction.label) {
                    Some(sentiment) => StoryContext {
                        sentiment,
                        ..context
                    },
                    None => {
                        tracing::debug!(label = %prediction.label, "unrecognized sentiment label");
                        context
                    }
                }
            }
            Ok(_) => context,
            Err(e) => {
                tracing::warn!(model = %model, error = %e, "sentiment classification failed, keeping keyword verdict");
                context
            }
        }
    }
}

/// Fall back to a truncated excerpt when the model itself reported a failure
fn degrade(result: Result<String>, source: &str, max_chars: usize, stage: &str) -> Result<String> {
    match result {
        Ok(summary) => Ok(summary),
        Err(Error::Model(e)) => {
            tracing::warn!(stage, error = %e, "summarization failed, using truncated text");
            Ok(text::truncate_chars(source, max_chars).to_string())
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ArticleSummarizer for NewsSummarizer {
    async fn summarize(
        &self,
        title: &str,
        text: &str,
        overrides: &SummaryOverrides,
    ) -> Result<Summary> {
        if overrides.is_empty() {
            return self.summarize_article(title, text).await;
        }
        let config = self.config.with_overrides(overrides);
        config
            .validate()
            .map_err(|(field, message)| Error::validation(format!("config.{field}"), message))?;
        self.summarize_with(title, text, &config).await
    }
}
