//! `check` — classify every registered pick against the drawings of a range.
//!
//! The date-range filter is applied here, by the caller, never inside the
//! scraping core. Without an explicit range the latest ten drawings are
//! considered, mirroring what the results site itself shows.

use chrono::{Local, Months, NaiveDate};
use tracing::info;

use crate::core::prize::classify;
use crate::core::types::{DrawRecord, MatchResult};
use crate::scraping::merge::merge_sources;
use crate::scraping::scrape::Scraper;
use crate::scraping::sources;
use crate::store::Store;

const DEFAULT_DISPLAY_COUNT: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
pub struct CheckOptions {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug)]
pub struct CheckOutcome {
    /// Drawings the picks were classified against. Empty means "no winning
    /// numbers resolved" — an expected state, not an error.
    pub draws_considered: usize,
    pub results: Vec<MatchResult>,
}

pub async fn run_check(
    scraper: &Scraper,
    store: &mut Store,
    options: CheckOptions,
) -> anyhow::Result<CheckOutcome> {
    let picks = store.picks()?;
    if picks.is_empty() {
        anyhow::bail!("no registered picks; add one with `add-pick`");
    }

    let today = Local::now().date_naive();
    let explicit_range = options.start.is_some() || options.end.is_some();
    let start = options.start.unwrap_or_else(|| {
        today
            .checked_sub_months(Months::new(2))
            .unwrap_or(today)
    });
    let end = options.end.unwrap_or(today);

    let urls = sources::urls_for_range(start, end, today);
    info!(?start, ?end, urls = urls.len(), "checking picks");

    let merged = merge_sources(scraper, &urls).await;
    store.upsert_draws(&merged)?;

    let considered: Vec<DrawRecord> = if explicit_range {
        merged
            .into_iter()
            .filter(|d| d.draw_date >= start && d.draw_date <= end)
            .collect()
    } else {
        merged.into_iter().take(DEFAULT_DISPLAY_COUNT).collect()
    };

    let mut results = Vec::with_capacity(picks.len() * considered.len());
    for pick in &picks {
        for draw in &considered {
            results.push(classify(pick, draw));
        }
    }

    Ok(CheckOutcome {
        draws_considered: considered.len(),
        results,
    })
}
