//! `import` — bulk CSV import of historical drawings.
//!
//! Row format: `draw_number, date, n1..n6, bonus`. Dates arrive as
//! `YYYY/MM/DD`, `YYYY-MM-DD`, or `<year>年<month>月<day>日`; all are
//! normalized before the same validity gate extraction uses. Bad rows are
//! collected, never aborting the batch.

use std::path::Path;

use tracing::info;

use crate::core::dates::normalize_date;
use crate::core::types::DrawRecord;
use crate::store::Store;

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

/// Comma split with double-quote awareness; exports wrap dates in quotes.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn looks_like_header(line: &str) -> bool {
    line.contains("開催回") || line.contains("回号")
}

fn parse_row(row: &[String], line_no: usize) -> Result<DrawRecord, String> {
    if row.len() < 9 {
        return Err(format!("line {line_no}: expected 9 columns, got {}", row.len()));
    }
    let draw_number: u32 = row[0]
        .parse()
        .map_err(|_| format!("line {line_no}: bad draw number {:?}", row[0]))?;
    let date = normalize_date(&row[1])
        .ok_or_else(|| format!("line {line_no}: bad date {:?}", row[1]))?;

    let mut mains = [0u8; 6];
    for (i, slot) in mains.iter_mut().enumerate() {
        *slot = row[2 + i]
            .parse()
            .map_err(|_| format!("line {line_no}: bad number {:?}", row[2 + i]))?;
    }
    let bonus: u8 = row[8]
        .parse()
        .map_err(|_| format!("line {line_no}: bad bonus {:?}", row[8]))?;

    DrawRecord::new(date, &mains, bonus, Some(draw_number))
        .map_err(|e| format!("line {line_no}: {e}"))
}

/// Parse CSV text into gate-valid records plus per-row errors.
pub fn parse_csv(text: &str) -> (Vec<DrawRecord>, Vec<String>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || (idx == 0 && looks_like_header(line)) {
            continue;
        }
        match parse_row(&split_row(line), idx + 1) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e),
        }
    }
    (records, errors)
}

pub fn run_import(store: &mut Store, path: &Path) -> anyhow::Result<ImportSummary> {
    let text = std::fs::read_to_string(path)?;
    let (records, errors) = parse_csv(&text);
    let (imported, updated) = store.upsert_draws(&records)?;
    info!(
        imported,
        updated,
        failed = errors.len(),
        "import finished"
    );
    Ok(ImportSummary {
        imported,
        updated,
        errors,
    })
}
