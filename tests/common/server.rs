//! Spawning a real API server on an ephemeral port

use newsbrief::{Config, NewsApiClient, NewsSummarizer, SummaryService};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::API_KEY;

/// A server running in the background
pub struct TestServer {
    /// `http://127.0.0.1:{port}`
    pub base_url: String,
    /// The service behind the server
    pub service: SummaryService,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<newsbrief::Result<()>>,
}

impl TestServer {
    /// Client holding the server's API key
    pub fn client(&self) -> NewsApiClient {
        NewsApiClient::new(&self.base_url, Some(API_KEY.into()))
            .expect("test server URL is valid")
    }

    /// Client without credentials
    pub fn anonymous_client(&self) -> NewsApiClient {
        NewsApiClient::new(&self.base_url, None).expect("test server URL is valid")
    }

    /// Signal shutdown and wait for the server (and its drain) to finish
    pub async fn stop(self) -> SummaryService {
        self.stop.send(()).ok();
        self.handle
            .await
            .expect("server task panicked")
            .expect("server exited with an error");
        self.service
    }
}

/// Build the hub-backed summarizer and service for `config`, then serve it
pub async fn spawn_server(config: Config) -> TestServer {
    config.validate().expect("test config is valid");
    let summarizer = Arc::new(NewsSummarizer::new(&config).expect("summarizer builds"));
    let service = SummaryService::new(config.clone(), summarizer)
        .await
        .expect("service starts");

    let listener = TcpListener::bind(config.server.api.bind_address)
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener has an address");
    let (stop, stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(newsbrief::api::serve(listener, service.clone(), async move {
        stopped.await.ok();
    }));

    TestServer {
        base_url: format!("http://{addr}"),
        service,
        stop,
        handle,
    }
}
