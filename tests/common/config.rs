//! Test configuration: offline configs pointed at a mock hub, live configs from `.env`

use newsbrief::Config;
use newsbrief::config::{QuotaPeriod, RateQuota};

/// API key every test server is started with
pub const API_KEY: &str = "integration-key";

/// Config for a server backed by a mock model hub at `hub_url`
///
/// Binds to an ephemeral port, keeps rate limits generous and disables the
/// sentiment model unless a test turns it back on.
pub fn mock_hub_config(hub_url: &str) -> Config {
    let mut config = Config::default();
    config.models.hub_url = hub_url.to_string();
    config.models.hub_token = Some("hf_mock".into());
    config.models.sentiment_model = None;
    config.models.request_timeout_secs = 5;
    config.tasks.workers = 2;
    config.tasks.processing_timeout_secs = 10;
    config.tasks.drain_timeout_secs = 5;
    config.server.api.bind_address = ([127, 0, 0, 1], 0).into();
    config.server.api.api_key = Some(API_KEY.into());
    config.server.api.swagger_ui = false;
    config.server.api.rate_limit.submit = RateQuota::new(1000, QuotaPeriod::Minute);
    config.server.api.rate_limit.status = RateQuota::new(1000, QuotaPeriod::Minute);
    config.server.api.rate_limit.sync = RateQuota::new(1000, QuotaPeriod::Minute);
    config
}

/// Whether `HF_API_TOKEN` is available (from the environment or `.env`)
pub fn has_live_credentials() -> bool {
    dotenvy::dotenv().ok();
    std::env::var("HF_API_TOKEN").is_ok_and(|t| !t.trim().is_empty())
}

/// Config for talking to the real hosted model hub
///
/// Cold models can take a while to load, so the request timeout is generous.
pub fn live_config() -> Config {
    dotenvy::dotenv().ok();
    let mut config = Config::default();
    config.models.hub_token = std::env::var("HF_API_TOKEN").ok();
    if let Ok(url) = std::env::var("HF_HUB_URL") {
        config.models.hub_url = url;
    }
    config.models.request_timeout_secs = 180;
    config.server.api.bind_address = ([127, 0, 0, 1], 0).into();
    config.server.api.api_key = Some(API_KEY.into());
    config
}

/// Skip test if the model hub token is unavailable
#[macro_export]
macro_rules! skip_if_no_credentials {
    () => {
        if !$crate::common::has_live_credentials() {
            eprintln!("Skipping test: HF_API_TOKEN not found in environment or .env");
            return;
        }
    };
}
