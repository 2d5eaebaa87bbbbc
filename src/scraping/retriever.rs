//! Page retrieval strategies.
//!
//! Two substitutable backends fetch the raw HTML of a results page: a plain
//! HTTP GET and a headless-browser render. Escalation between them lives in
//! the orchestrator ([`crate::scraping::scrape`]), not here, so each variant
//! stays independently mockable.

use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use reqwest::Client;
use tracing::debug;

use crate::core::config::{RenderingBackend, WatchConfig};
use crate::core::error::ScrapeError;
use crate::scraping::browser_manager::{self, RenderBudget, DESKTOP_USER_AGENT};

/// Which retrieval strategy produced the HTML. The extractor prefers the
/// flat marker strategy on rendered markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    Static,
    Rendered,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch the page body for `url`.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;

    fn mode(&self) -> RetrievalMode;
}

/// Single HTTP GET with a desktop User-Agent. Transient transport failures
/// are retried with bounded exponential backoff; a non-success HTTP status
/// is permanent and fails immediately.
pub struct StaticRetriever {
    client: Client,
}

impl StaticRetriever {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(DESKTOP_USER_AGENT)
            .build()
            .expect("reqwest client");
        Self { client }
    }

    async fn get_once(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Fetch {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            source: e,
        })
    }
}

impl Default for StaticRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let body = retry(
            ExponentialBackoffBuilder::new()
                .with_initial_interval(std::time::Duration::from_millis(200))
                .with_max_interval(std::time::Duration::from_secs(2))
                .with_max_elapsed_time(Some(std::time::Duration::from_secs(6)))
                .build(),
            || async {
                match self.get_once(url).await {
                    Ok(body) => Ok(body),
                    Err(e @ ScrapeError::Fetch { .. }) => Err(backoff::Error::transient(e)),
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            },
        )
        .await?;
        debug!(url, bytes = body.len(), "static fetch succeeded");
        Ok(body)
    }

    fn mode(&self) -> RetrievalMode {
        RetrievalMode::Static
    }
}

/// Headless-browser retrieval for pages whose numbers arrive via script
/// injection. One exclusive browser instance per call, released on every
/// exit path.
pub struct RenderedRetriever {
    backend: RenderingBackend,
    budget: RenderBudget,
}

impl RenderedRetriever {
    pub fn new(backend: RenderingBackend, budget: RenderBudget) -> Self {
        Self { backend, budget }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(
            config.resolve_rendering_backend(),
            RenderBudget {
                navigation_ms: config.resolve_navigation_timeout_ms(),
                idle_ms: config.resolve_idle_timeout_ms(),
                grace_ms: config.resolve_render_grace_ms(),
            },
        )
    }
}

#[async_trait]
impl Retriever for RenderedRetriever {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        browser_manager::fetch_rendered_html(url, &self.backend, self.budget).await
    }

    fn mode(&self) -> RetrievalMode {
        RetrievalMode::Rendered
    }
}
