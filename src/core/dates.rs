//! Draw-date parsing.
//!
//! Results pages print dates in Japanese calendar notation (`2026年1月5日`);
//! bulk CSV exports additionally use `YYYY/MM/DD` and `YYYY-MM-DD`. All three
//! normalize to a `NaiveDate` (canonical textual form `YYYY-MM-DD`).

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

static JP_DATE: OnceLock<Regex> = OnceLock::new();

fn jp_date_re() -> &'static Regex {
    JP_DATE.get_or_init(|| {
        Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日").expect("valid date pattern")
    })
}

/// Find the first `<year>年<month>月<day>日` occurrence in `text`.
/// The match may be embedded in surrounding prose.
pub fn parse_japanese_date(text: &str) -> Option<NaiveDate> {
    let caps = jp_date_re().captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Normalize any accepted date form: `YYYY/M/D`, `YYYY-M-D`, or Japanese
/// calendar notation. Month and day may be unpadded.
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.contains('年') {
        return parse_japanese_date(text);
    }
    let sep = if text.contains('/') { '/' } else { '-' };
    let mut parts = text.split(sep);
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
