//! Draw-record extraction from results-page HTML.
//!
//! The upstream markup is not contractually stable, so every field is
//! resolved through a primary/fallback chain and each table attempt produces
//! a [`TableDiagnostic`] recording which tier (if any) resolved each field.
//! Two strategies exist:
//!
//! * [`extract_table`] — row-scoped: fields are located through their label
//!   rows (`抽せん日` / `本数字` / `ボーナス数字`). Primary for static markup.
//! * [`extract_markers`] — marker-scoped: a flat page-wide search for the
//!   `.js-lottery-*` decorated elements, without label rows. Simpler and
//!   faster, but only present on some (rendered) markup variants.
//!
//! Acceptance gate per table: exactly six valid main numbers, a valid bonus
//! number, and a resolved draw date. Anything less contributes nothing — the
//! table is skipped, never erred. A table whose numbers parse but whose date
//! does not is rejected rather than stamped with the current date; fabricating
//! a date would corrupt the date-keyed upsert downstream.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::core::dates;
use crate::core::types::{DrawRecord, MAIN_COUNT, NUMBER_MAX, NUMBER_MIN};

const DATE_LABEL: &str = "抽せん日";
const MAIN_LABEL: &str = "本数字";
const BONUS_LABEL: &str = "ボーナス数字";

struct Selectors {
    table: Selector,
    tr: Selector,
    th: Selector,
    td: Selector,
    p: Selector,
    date_pc: Selector,
    number_pc: Selector,
    bonus_pc: Selector,
    issue_pc: Selector,
    bold: Selector,
}

static SELECTORS: OnceLock<Selectors> = OnceLock::new();

fn selectors() -> &'static Selectors {
    SELECTORS.get_or_init(|| {
        let parse = |s| Selector::parse(s).expect("valid selector");
        Selectors {
            table: parse("table"),
            tr: parse("tr"),
            th: parse("th"),
            td: parse("td"),
            p: parse("p"),
            date_pc: parse(".js-lottery-date-pc"),
            number_pc: parse(".js-lottery-number-pc"),
            bonus_pc: parse(".js-lottery-bonus-pc"),
            issue_pc: parse(".js-lottery-issue-pc"),
            bold: parse("b.section__text--bold"),
        }
    })
}

static DRAW_NO: OnceLock<Regex> = OnceLock::new();
static DIGIT_RUN: OnceLock<Regex> = OnceLock::new();
static PAREN_DIGITS: OnceLock<Regex> = OnceLock::new();

fn draw_no_re() -> &'static Regex {
    DRAW_NO.get_or_init(|| Regex::new(r"第(\d+)回").expect("valid pattern"))
}

fn digit_run_re() -> &'static Regex {
    DIGIT_RUN.get_or_init(|| Regex::new(r"\d+").expect("valid pattern"))
}

fn paren_digits_re() -> &'static Regex {
    PAREN_DIGITS.get_or_init(|| Regex::new(r"\((\d+)\)").expect("valid pattern"))
}

/// Which tier of a field's fallback chain resolved it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    /// No tier yielded a usable value.
    Missing,
    /// The designated decorated element (`.js-lottery-*`).
    Primary,
    /// The fallback element (`b.section__text--bold`, or `p` for dates).
    Fallback,
    /// Raw data-cell text (date chain only).
    RawCell,
}

/// Structured outcome of one extraction attempt, emitted to observability
/// instead of the raw-HTML debug dumps this replaces.
#[derive(Debug, Clone, Serialize)]
pub struct TableDiagnostic {
    pub table_index: usize,
    pub strategy: &'static str,
    pub date: FieldStatus,
    pub draw_number: FieldStatus,
    /// Tier that resolved the first main-number cell.
    pub main_numbers: FieldStatus,
    pub main_found: usize,
    pub bonus: FieldStatus,
    pub accepted: bool,
    /// Set when the table held partial data but failed the gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
}

impl TableDiagnostic {
    fn new(table_index: usize, strategy: &'static str) -> Self {
        Self {
            table_index,
            strategy,
            date: FieldStatus::Missing,
            draw_number: FieldStatus::Missing,
            main_numbers: FieldStatus::Missing,
            main_found: 0,
            bonus: FieldStatus::Missing,
            accepted: false,
            reject_reason: None,
        }
    }
}

pub struct TableOutcome {
    pub record: Option<DrawRecord>,
    pub diagnostic: TableDiagnostic,
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// First run of digits in `text`, as a playable number.
fn first_number(text: &str) -> Option<u8> {
    let m = digit_run_re().find(text)?;
    let n: u32 = m.as_str().parse().ok()?;
    u8::try_from(n).ok().filter(|&n| playable(n))
}

/// Bonus cells may print the value parenthesized, e.g. `(03)`.
fn bonus_number(text: &str) -> Option<u8> {
    if let Some(caps) = paren_digits_re().captures(text) {
        let n: u32 = caps[1].parse().ok()?;
        return u8::try_from(n).ok().filter(|&n| playable(n));
    }
    first_number(text)
}

fn playable(n: u8) -> bool {
    (NUMBER_MIN..=NUMBER_MAX).contains(&n)
}

/// First row of `table` whose label cell (`th`) contains `label`.
fn find_label_row<'a>(table: ElementRef<'a>, label: &str) -> Option<ElementRef<'a>> {
    let s = selectors();
    table.select(&s.tr).find(|row| {
        row.select(&s.th)
            .any(|th| element_text(th).contains(label))
    })
}

/// Date chain: first non-empty candidate wins, then must parse.
fn resolve_date(row: ElementRef<'_>) -> (Option<NaiveDate>, FieldStatus) {
    let s = selectors();
    let tiers: [(&Selector, FieldStatus); 3] = [
        (&s.date_pc, FieldStatus::Primary),
        (&s.p, FieldStatus::Fallback),
        (&s.td, FieldStatus::RawCell),
    ];
    for (sel, tier) in tiers {
        let Some(el) = row.select(sel).next() else {
            continue;
        };
        let text = element_text(el);
        if text.is_empty() {
            continue;
        }
        match dates::parse_japanese_date(&text) {
            Some(date) => return (Some(date), tier),
            None => return (None, FieldStatus::Missing),
        }
    }
    (None, FieldStatus::Missing)
}

/// Number cells: the decorated element first, bold fallback second.
fn number_cell_text(td: ElementRef<'_>, primary: &Selector) -> Option<(String, FieldStatus)> {
    let s = selectors();
    if let Some(el) = td.select(primary).next() {
        return Some((element_text(el), FieldStatus::Primary));
    }
    td.select(&s.bold)
        .next()
        .map(|el| (element_text(el), FieldStatus::Fallback))
}

fn gate(
    date: Option<NaiveDate>,
    mains: &[u8],
    bonus: Option<u8>,
    draw_number: Option<u32>,
    diag: &mut TableDiagnostic,
) -> Option<DrawRecord> {
    diag.main_found = mains.len();
    let complete = mains.len() == MAIN_COUNT && bonus.is_some();
    let Some(bonus) = bonus.filter(|_| complete) else {
        if !mains.is_empty() || bonus.is_some() {
            diag.reject_reason = Some(format!(
                "incomplete: {} main numbers, bonus {}",
                mains.len(),
                if bonus.is_some() { "found" } else { "missing" },
            ));
        }
        return None;
    };
    let Some(date) = date else {
        // Numbers are complete but the date never resolved. Surface for
        // review instead of guessing — a fabricated date would collide with
        // an unrelated drawing in the date-keyed store.
        diag.reject_reason = Some("date unresolved".to_string());
        return None;
    };
    match DrawRecord::new(date, mains, bonus, draw_number) {
        Ok(record) => {
            diag.accepted = true;
            Some(record)
        }
        Err(e) => {
            diag.reject_reason = Some(e.to_string());
            None
        }
    }
}

/// Row-scoped extraction: one table node → at most one draw record.
pub fn extract_table(table: ElementRef<'_>, table_index: usize) -> TableOutcome {
    let s = selectors();
    let mut diag = TableDiagnostic::new(table_index, "row_scoped");

    let mut date = None;
    if let Some(row) = find_label_row(table, DATE_LABEL) {
        let (resolved, tier) = resolve_date(row);
        date = resolved;
        diag.date = tier;
    }

    let table_text: String = table.text().collect();
    let draw_number = draw_no_re()
        .captures(&table_text)
        .and_then(|caps| caps[1].parse::<u32>().ok());
    if draw_number.is_some() {
        diag.draw_number = FieldStatus::Primary;
    }

    let mut mains: Vec<u8> = Vec::with_capacity(MAIN_COUNT);
    if let Some(row) = find_label_row(table, MAIN_LABEL) {
        for td in row.select(&s.td) {
            let Some((text, tier)) = number_cell_text(td, &s.number_pc) else {
                continue;
            };
            if let Some(n) = first_number(&text) {
                if mains.is_empty() {
                    diag.main_numbers = tier;
                }
                mains.push(n);
            }
        }
    }

    let mut bonus = None;
    if let Some(row) = find_label_row(table, BONUS_LABEL) {
        for td in row.select(&s.td) {
            let Some((text, tier)) = number_cell_text(td, &s.bonus_pc) else {
                continue;
            };
            if let Some(n) = bonus_number(&text) {
                bonus = Some(n);
                diag.bonus = tier;
                break;
            }
        }
    }

    let record = gate(date, &mains, bonus, draw_number, &mut diag);
    TableOutcome {
        record,
        diagnostic: diag,
    }
}

/// `true` when the page carries the decorated marker elements the flat
/// strategy needs.
pub fn has_markers(doc: &Html) -> bool {
    doc.select(&selectors().number_pc).next().is_some()
}

/// Marker-scoped extraction: flat page-wide element search, no label rows.
/// Expects exactly one drawing's markers on the page; any other main-number
/// cardinality fails the gate (and the caller falls back to table
/// enumeration).
pub fn extract_markers(doc: &Html) -> TableOutcome {
    let s = selectors();
    let mut diag = TableDiagnostic::new(0, "marker_scoped");

    let date = doc.select(&s.date_pc).next().and_then(|el| {
        let parsed = dates::parse_japanese_date(&element_text(el));
        if parsed.is_some() {
            diag.date = FieldStatus::Primary;
        }
        parsed
    });

    let draw_number = doc.select(&s.issue_pc).next().and_then(|el| {
        let text = element_text(el);
        draw_no_re()
            .captures(&text)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .or_else(|| {
                digit_run_re()
                    .find(&text)
                    .and_then(|m| m.as_str().parse::<u32>().ok())
            })
    });
    if draw_number.is_some() {
        diag.draw_number = FieldStatus::Primary;
    }

    let mains: Vec<u8> = doc
        .select(&s.number_pc)
        .filter_map(|el| first_number(&element_text(el)))
        .collect();
    if !mains.is_empty() {
        diag.main_numbers = FieldStatus::Primary;
    }

    let bonus = doc
        .select(&s.bonus_pc)
        .find_map(|el| bonus_number(&element_text(el)));
    if bonus.is_some() {
        diag.bonus = FieldStatus::Primary;
    }

    let record = gate(date, &mains, bonus, draw_number, &mut diag);
    TableOutcome {
        record,
        diagnostic: diag,
    }
}

/// Parse `html` and extract every gate-passing record in document order.
///
/// With `prefer_markers` (rendered retrieval) the flat marker strategy is
/// tried first; row-scoped table enumeration is the fallback either way.
pub fn extract_records(
    html: &str,
    prefer_markers: bool,
) -> (Vec<DrawRecord>, Vec<TableDiagnostic>) {
    let doc = Html::parse_document(html);
    let mut records = Vec::new();
    let mut diagnostics = Vec::new();

    if prefer_markers && has_markers(&doc) {
        let outcome = extract_markers(&doc);
        let hit = outcome.record.is_some();
        diagnostics.push(outcome.diagnostic);
        if let Some(record) = outcome.record {
            records.push(record);
        }
        if hit {
            return (records, diagnostics);
        }
        // Markers present but gate failed (e.g. several drawings on one
        // page) — the label rows still know which numbers belong together.
    }

    for (index, table) in doc.select(&selectors().table).enumerate() {
        let outcome = extract_table(table, index);
        diagnostics.push(outcome.diagnostic);
        if let Some(record) = outcome.record {
            records.push(record);
        }
    }
    (records, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Markup shape of the official results page, PC layout.
    fn decorated_table(date: &str, draw_no: &str, mains: &[&str], bonus: &str) -> String {
        let main_cells = mains
            .iter()
            .map(|n| format!(r#"<td><b class="js-lottery-number-pc">{n}</b></td>"#))
            .collect::<String>();
        format!(
            r#"<table>
                <tr><th>回別</th><td>{draw_no}</td></tr>
                <tr><th>抽せん日</th><td><p class="js-lottery-date-pc">{date}</p></td></tr>
                <tr><th>本数字</th>{main_cells}</tr>
                <tr><th>ボーナス数字</th><td><b class="js-lottery-bonus-pc">{bonus}</b></td></tr>
            </table>"#
        )
    }

    /// Older markup: no decorated classes, bold cells only, date as plain text.
    fn bold_table(date: &str, mains: &[&str], bonus: &str) -> String {
        let main_cells = mains
            .iter()
            .map(|n| format!(r#"<td><b class="section__text--bold">{n}</b></td>"#))
            .collect::<String>();
        format!(
            r#"<table>
                <tr><th>抽せん日</th><td><p>{date}</p></td></tr>
                <tr><th>本数字</th>{main_cells}</tr>
                <tr><th>ボーナス数字</th><td><b class="section__text--bold">{bonus}</b></td></tr>
            </table>"#
        )
    }

    const SIX: &[&str] = &["03", "08", "14", "22", "29", "41"];

    #[test]
    fn decorated_markup_extracts_on_primary_tier() {
        let html = decorated_table("2024年5月10日", "第1900回", SIX, "(07)");
        let (records, diags) = extract_records(&html, false);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.draw_date, ymd(2024, 5, 10));
        assert_eq!(rec.main_numbers, [3, 8, 14, 22, 29, 41]);
        assert_eq!(rec.bonus_number, 7);
        assert_eq!(rec.draw_number, Some(1900));
        let d = &diags[0];
        assert_eq!(d.date, FieldStatus::Primary);
        assert_eq!(d.main_numbers, FieldStatus::Primary);
        assert_eq!(d.bonus, FieldStatus::Primary);
        assert!(d.accepted);
    }

    #[test]
    fn bold_markup_extracts_on_fallback_tier() {
        let html = bold_table("2024年12月30日", SIX, "(07)");
        let (records, diags) = extract_records(&html, false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].draw_date, ymd(2024, 12, 30));
        assert_eq!(records[0].draw_number, None);
        let d = &diags[0];
        assert_eq!(d.date, FieldStatus::Fallback);
        assert_eq!(d.main_numbers, FieldStatus::Fallback);
        assert_eq!(d.bonus, FieldStatus::Fallback);
    }

    #[test]
    fn date_from_raw_cell_text() {
        let html = r#"<table>
            <tr><th>抽せん日</th><td>2024年5月10日</td></tr>
            <tr><th>本数字</th>
                <td><b class="section__text--bold">1</b></td>
                <td><b class="section__text--bold">2</b></td>
                <td><b class="section__text--bold">3</b></td>
                <td><b class="section__text--bold">4</b></td>
                <td><b class="section__text--bold">5</b></td>
                <td><b class="section__text--bold">6</b></td></tr>
            <tr><th>ボーナス数字</th><td><b class="section__text--bold">7</b></td></tr>
        </table>"#;
        let (records, diags) = extract_records(html, false);
        assert_eq!(records.len(), 1);
        assert_eq!(diags[0].date, FieldStatus::RawCell);
    }

    #[test]
    fn incomplete_table_yields_nothing() {
        // Only five valid main-number cells: gate must reject.
        let html = decorated_table("2024年5月10日", "第1900回", &SIX[..5], "(07)");
        let (records, diags) = extract_records(&html, false);
        assert!(records.is_empty());
        assert!(!diags[0].accepted);
        assert_eq!(diags[0].main_found, 5);
        assert!(diags[0].reject_reason.as_deref().unwrap().contains("incomplete"));
    }

    #[test]
    fn out_of_range_cells_are_dropped() {
        let with_bad = &["03", "08", "14", "22", "29", "44"][..];
        let html = decorated_table("2024年5月10日", "第1900回", with_bad, "(07)");
        let (records, diags) = extract_records(&html, false);
        assert!(records.is_empty());
        assert_eq!(diags[0].main_found, 5);
    }

    #[test]
    fn unresolved_date_rejects_instead_of_guessing() {
        let html = decorated_table("来週発表", "第1900回", SIX, "(07)");
        let (records, diags) = extract_records(&html, false);
        assert!(records.is_empty());
        let d = &diags[0];
        assert_eq!(d.date, FieldStatus::Missing);
        assert_eq!(d.main_found, 6);
        assert_eq!(d.reject_reason.as_deref(), Some("date unresolved"));
    }

    #[test]
    fn bonus_without_parentheses_parses_too() {
        let html = decorated_table("2024年5月10日", "第1900回", SIX, "07");
        let (records, _) = extract_records(&html, false);
        assert_eq!(records[0].bonus_number, 7);
    }

    #[test]
    fn multiple_tables_in_document_order() {
        let a = decorated_table("2024年5月10日", "第1900回", SIX, "(07)");
        let b = decorated_table("2024年5月6日", "第1899回", &["01", "05", "12", "19", "33", "40"], "(21)");
        let html = format!("{a}{b}");
        let (records, _) = extract_records(&html, false);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].draw_date, ymd(2024, 5, 10));
        assert_eq!(records[1].draw_date, ymd(2024, 5, 6));
    }

    #[test]
    fn marker_strategy_reads_flat_layout() {
        let html = r#"
            <div class="js-lottery-issue-pc">第1900回</div>
            <span class="js-lottery-date-pc">2024年5月10日</span>
            <span class="js-lottery-number-pc">03</span>
            <span class="js-lottery-number-pc">08</span>
            <span class="js-lottery-number-pc">14</span>
            <span class="js-lottery-number-pc">22</span>
            <span class="js-lottery-number-pc">29</span>
            <span class="js-lottery-number-pc">41</span>
            <span class="js-lottery-bonus-pc">(07)</span>"#;
        let (records, diags) = extract_records(html, true);
        assert_eq!(records.len(), 1);
        assert_eq!(diags[0].strategy, "marker_scoped");
        assert_eq!(records[0].draw_number, Some(1900));
        assert_eq!(records[0].main_numbers, [3, 8, 14, 22, 29, 41]);
    }

    #[test]
    fn marker_preference_falls_back_to_tables_when_absent() {
        let html = decorated_table("2024年5月10日", "第1900回", SIX, "(07)");
        // number_pc markers ARE present inside the table; flat search still
        // resolves them page-wide, so this exercises the marker path.
        let (records, diags) = extract_records(&html, true);
        assert_eq!(records.len(), 1);
        assert_eq!(diags[0].strategy, "marker_scoped");

        // Strip the decorated classes: flat search finds nothing, row-scoped
        // enumeration takes over.
        let plain = bold_table("2024年5月10日", SIX, "(07)");
        let (records, diags) = extract_records(&plain, true);
        assert_eq!(records.len(), 1);
        assert_eq!(diags[0].strategy, "row_scoped");
    }

    #[test]
    fn marker_gate_failure_falls_back_to_row_scoped() {
        // Two drawings' markers on one page: twelve number elements fail the
        // flat gate, but the label rows still resolve both tables.
        let a = decorated_table("2024年5月10日", "第1900回", SIX, "(07)");
        let b = decorated_table("2024年5月6日", "第1899回", &["01", "05", "12", "19", "33", "40"], "(21)");
        let html = format!("{a}{b}");
        let (records, diags) = extract_records(&html, true);
        assert_eq!(records.len(), 2);
        assert_eq!(diags[0].strategy, "marker_scoped");
        assert!(!diags[0].accepted);
        assert!(records.iter().all(|r| r.draw_number.is_some()));
    }
}
