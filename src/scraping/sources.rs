//! Source-URL generation.
//!
//! The official site publishes the current results on an index page and one
//! archive page per past month (`YYYYMM.html` under the same prefix). A date
//! range therefore maps to: the index page when the range touches the
//! current month, plus one archive page per fully-past month.

use chrono::{Datelike, NaiveDate};

use crate::core::config::{ARCHIVE_URL_PREFIX, DEFAULT_RESULTS_URL};

pub fn latest_url() -> String {
    DEFAULT_RESULTS_URL.to_string()
}

pub fn month_url(year: i32, month: u32) -> String {
    format!("{ARCHIVE_URL_PREFIX}{year}{month:02}.html")
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("day 1 always valid")
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).expect("day 1 always valid")
}

/// URLs covering `[start, end]`, index page first (so the freshest source
/// wins the first-seen merge), then archive months ascending.
pub fn urls_for_range(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Vec<String> {
    let current_month = first_of_month(today);
    let end_month = first_of_month(end);
    let mut urls = Vec::new();

    if end_month >= current_month {
        urls.push(latest_url());
    }

    let mut month = first_of_month(start);
    while month <= end_month && month < current_month {
        urls.push(month_url(month.year(), month.month()));
        month = next_month(month);
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_touching_current_month_uses_index() {
        let urls = urls_for_range(ymd(2024, 3, 10), ymd(2024, 5, 15), ymd(2024, 5, 15));
        assert_eq!(
            urls,
            vec![
                latest_url(),
                month_url(2024, 3),
                month_url(2024, 4),
            ]
        );
    }

    #[test]
    fn fully_past_range_uses_archives_only() {
        let urls = urls_for_range(ymd(2023, 11, 1), ymd(2024, 1, 31), ymd(2024, 5, 15));
        assert_eq!(
            urls,
            vec![
                month_url(2023, 11),
                month_url(2023, 12),
                month_url(2024, 1),
            ]
        );
    }

    #[test]
    fn current_month_only() {
        let urls = urls_for_range(ymd(2024, 5, 1), ymd(2024, 5, 15), ymd(2024, 5, 15));
        assert_eq!(urls, vec![latest_url()]);
    }

    #[test]
    fn year_boundary_is_covered_once_per_month() {
        let urls = urls_for_range(ymd(2023, 12, 20), ymd(2024, 2, 1), ymd(2024, 5, 15));
        assert_eq!(urls, vec![month_url(2023, 12), month_url(2024, 1), month_url(2024, 2)]);
    }
}
