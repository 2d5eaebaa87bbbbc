//! `update` — scrape the configured result pages and reconcile the store.

use tracing::{info, warn};

use crate::core::error::ScrapeError;
use crate::core::types::DrawRecord;
use crate::scraping::merge::merge_records;
use crate::scraping::scrape::Scraper;
use crate::store::Store;

#[derive(Debug, Default)]
pub struct UpdateSummary {
    pub scraped: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Scrape every configured source and upsert the merged records.
///
/// A source that fails is skipped, but if *every* source fails with an
/// infrastructure error the last one propagates — "the site is unreachable"
/// must read differently from "no drawings published yet".
pub async fn run_update(
    scraper: &Scraper,
    store: &mut Store,
    sources: &[String],
) -> anyhow::Result<UpdateSummary> {
    let mut collected: Vec<DrawRecord> = Vec::new();
    let mut any_ok = false;
    let mut last_err: Option<ScrapeError> = None;

    for url in sources {
        match scraper.scrape(url).await {
            Ok(records) => {
                any_ok = true;
                collected.extend(records);
            }
            Err(e) if e.is_empty() => {
                // Retrieval worked, the page just held no gate-passing table.
                any_ok = true;
                info!(%url, "source yielded no records");
            }
            Err(e) => {
                warn!(%url, error = %e, "source failed");
                last_err = Some(e);
            }
        }
    }

    if !any_ok {
        if let Some(e) = last_err {
            return Err(e.into());
        }
    }

    let records = merge_records(collected);
    let scraped = records.len();
    let (inserted, updated) = store.upsert_draws(&records)?;
    info!(scraped, inserted, updated, "update finished");
    Ok(UpdateSummary {
        scraped,
        inserted,
        updated,
    })
}
