//! Article fixtures and mock model hub responses

use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Summarization model used by the default config
pub const SUMMARY_MODEL: &str = "facebook/bart-large-cnn";

/// What the mock hub answers for every summarization call
pub const HUB_SUMMARY: &str =
    "Bitcoin surges past $71,000 as crypto funds log record inflows. Traders point to strong momentum.";

/// A short crypto market story, wrapped in a little markup
pub const BITCOIN_TITLE: &str = "Bitcoin jumps to record";
pub const BITCOIN_ARTICLE: &str = "<p>Bitcoin jumped 6% to $71,000 on Monday as crypto funds saw \
    record inflows.</p> Traders said momentum was strong across the market, with exchange \
    volumes climbing through the session. Ethereum also gained ground as volumes rose and \
    analysts pointed to renewed demand from institutional buyers.";

/// A story long enough to be chunked
pub fn long_article() -> String {
    let paragraph = "Central bank officials signalled on Tuesday that interest rates would stay \
        on hold while inflation cools, and markets across Europe and Asia responded with \
        steady gains as investors weighed the outlook for growth. ";
    paragraph.repeat(60)
}

/// Start a mock hub whose summarization model always answers [`HUB_SUMMARY`]
pub async fn start_mock_hub() -> MockServer {
    let hub = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/models/{SUMMARY_MODEL}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "summary_text": HUB_SUMMARY }])),
        )
        .mount(&hub)
        .await;
    hub
}

/// Start a mock hub where every model answers with `status` and a hub error body
pub async fn start_failing_hub(status: u16, message: &str) -> MockServer {
    let hub = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/models/.+"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": message })))
        .mount(&hub)
        .await;
    hub
}

/// Mount a sentiment model on `hub` that answers `label` with `score`
pub async fn mount_sentiment(hub: &MockServer, model: &str, label: &str, score: f32) {
    Mock::given(method("POST"))
        .and(path(format!("/models/{model}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            { "label": label, "score": score }
        ]])))
        .mount(hub)
        .await;
}
