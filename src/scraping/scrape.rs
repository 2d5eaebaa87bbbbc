//! Page-scrape orchestration.
//!
//! Escalation policy: static retrieval first; when it errors or yields zero
//! gate-passing records, escalate to the rendered retriever; if that also
//! fails, its error propagates. Successful per-URL results are cached so a
//! check run regenerating the same archive URLs does not refetch them.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::core::config::WatchConfig;
use crate::core::error::ScrapeError;
use crate::core::types::DrawRecord;
use crate::scraping::extract::{self, TableDiagnostic};
use crate::scraping::retriever::{
    RenderedRetriever, RetrievalMode, Retriever, StaticRetriever,
};

pub struct Scraper {
    primary: Box<dyn Retriever>,
    fallback: Box<dyn Retriever>,
    cache: moka::future::Cache<String, Arc<Vec<DrawRecord>>>,
}

impl Scraper {
    pub fn new(config: &WatchConfig) -> Self {
        Self::with_retrievers(
            Box::new(StaticRetriever::new()),
            Box::new(RenderedRetriever::from_config(config)),
        )
    }

    /// Inject retrieval backends; tests substitute canned-HTML mocks here.
    pub fn with_retrievers(primary: Box<dyn Retriever>, fallback: Box<dyn Retriever>) -> Self {
        Self {
            primary,
            fallback,
            cache: moka::future::Cache::builder()
                .max_capacity(64)
                .time_to_live(std::time::Duration::from_secs(60 * 10))
                .build(),
        }
    }

    /// Scrape one results page into gate-valid draw records, document order.
    pub async fn scrape(&self, url: &str) -> Result<Vec<DrawRecord>, ScrapeError> {
        let parsed = Url::parse(url).map_err(|_| ScrapeError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScrapeError::InvalidUrl(url.to_string()));
        }

        if let Some(cached) = self.cache.get(url).await {
            debug!(url, count = cached.len(), "scrape cache hit");
            return Ok((*cached).clone());
        }

        let records = match self.attempt(self.primary.as_ref(), url).await {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => {
                info!(url, "static retrieval yielded no records; escalating to rendered");
                self.escalate(url).await?
            }
            Err(e) => {
                warn!(url, error = %e, "static retrieval failed; escalating to rendered");
                self.escalate(url).await?
            }
        };

        self.cache
            .insert(url.to_string(), Arc::new(records.clone()))
            .await;
        Ok(records)
    }

    async fn escalate(&self, url: &str) -> Result<Vec<DrawRecord>, ScrapeError> {
        let records = self.attempt(self.fallback.as_ref(), url).await?;
        if records.is_empty() {
            return Err(ScrapeError::Empty {
                url: url.to_string(),
            });
        }
        Ok(records)
    }

    async fn attempt(
        &self,
        retriever: &dyn Retriever,
        url: &str,
    ) -> Result<Vec<DrawRecord>, ScrapeError> {
        let html = retriever.fetch(url).await?;
        let prefer_markers = retriever.mode() == RetrievalMode::Rendered;
        let (records, diagnostics) = extract::extract_records(&html, prefer_markers);
        emit_diagnostics(url, &diagnostics);
        info!(
            url,
            tables = diagnostics.len(),
            records = records.len(),
            mode = ?retriever.mode(),
            "extraction finished"
        );
        Ok(records)
    }
}

/// One structured event per extraction attempt, for the observability
/// pipeline. Rejections with partial data are the interesting ones: they are
/// how markup drift announces itself.
fn emit_diagnostics(url: &str, diagnostics: &[TableDiagnostic]) {
    for d in diagnostics {
        if d.accepted {
            debug!(
                url,
                table = d.table_index,
                strategy = d.strategy,
                date_tier = ?d.date,
                main_tier = ?d.main_numbers,
                bonus_tier = ?d.bonus,
                "table accepted"
            );
        } else if let Some(reason) = &d.reject_reason {
            warn!(
                url,
                table = d.table_index,
                strategy = d.strategy,
                main_found = d.main_found,
                reason = %reason,
                "table rejected"
            );
        } else {
            debug!(
                url,
                table = d.table_index,
                strategy = d.strategy,
                "table carried no draw data"
            );
        }
    }
}
