//! Multi-source merging.
//!
//! Archive pages overlap at month boundaries and the index page repeats the
//! newest archive entries, so the same drawing arrives from several URLs.
//! Records are keyed by draw date, first-seen-wins in arrival order; a
//! failing URL is logged and skipped, never aborting the whole merge.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::core::types::DrawRecord;
use crate::scraping::scrape::Scraper;

/// Dedupe by draw date (first occurrence wins) and sort descending by date.
pub fn merge_records<I>(records: I) -> Vec<DrawRecord>
where
    I: IntoIterator<Item = DrawRecord>,
{
    let mut by_date: HashMap<NaiveDate, DrawRecord> = HashMap::new();
    for record in records {
        by_date.entry(record.draw_date).or_insert(record);
    }
    let mut merged: Vec<DrawRecord> = by_date.into_values().collect();
    merged.sort_by(|a, b| b.draw_date.cmp(&a.draw_date));
    merged
}

/// Scrape every URL strictly sequentially (each scrape runs to completion,
/// success or caught failure, before the next begins) and merge the results.
pub async fn merge_sources(scraper: &Scraper, urls: &[String]) -> Vec<DrawRecord> {
    let mut collected: Vec<DrawRecord> = Vec::new();
    for url in urls {
        match scraper.scrape(url).await {
            Ok(records) => {
                info!(%url, count = records.len(), "source scraped");
                collected.extend(records);
            }
            Err(e) => {
                warn!(%url, error = %e, "source failed; skipping");
            }
        }
    }
    merge_records(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, first: u8) -> DrawRecord {
        DrawRecord::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            &[first, 10, 20, 30, 40, 43],
            5,
            None,
        )
        .unwrap()
    }

    #[test]
    fn first_seen_wins_per_date() {
        // Two sources both carry 2024-05-10 with different numbers; the one
        // arriving first must be retained without comparison.
        let merged = merge_records(vec![record("2024-05-10", 1), record("2024-05-10", 2)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].main_numbers[0], 1);
    }

    #[test]
    fn sorted_descending_by_date() {
        let merged = merge_records(vec![
            record("2024-05-06", 1),
            record("2024-05-13", 2),
            record("2024-05-10", 3),
        ]);
        let dates: Vec<String> = merged.iter().map(|r| r.draw_date.to_string()).collect();
        assert_eq!(dates, ["2024-05-13", "2024-05-10", "2024-05-06"]);
    }

    #[test]
    fn idempotent_on_repeated_input() {
        let input = vec![
            record("2024-05-06", 1),
            record("2024-05-13", 2),
            record("2024-05-10", 3),
        ];
        let once = merge_records(input.clone());
        let twice = merge_records(once.clone());
        assert_eq!(once, twice);
    }
}
