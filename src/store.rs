//! SQLite-backed draw history and user picks.
//!
//! `winning_numbers` is keyed by draw date with upsert semantics: a new date
//! inserts, an existing date overwrites the number fields. The scraping core
//! never mutates records in place; it only produces fresh candidates that
//! this store reconciles.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Result};

use crate::core::types::{DrawRecord, UserPick};

const DATE_FMT: &str = "%Y-%m-%d";

pub struct Store {
    conn: Connection,
}

/// Outcome of one upsert, for operation summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

fn conversion_err(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn numbers_to_text(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn numbers_from_text(text: &str, idx: usize) -> Result<Vec<u8>> {
    text.split(',')
        .map(|part| part.trim().parse::<u8>().map_err(|e| conversion_err(idx, e)))
        .collect()
}

impl Store {
    /// Open (or create) the database at `path`, creating parent directories
    /// and the schema as needed.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self::with_connection(conn)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS winning_numbers (
                draw_date TEXT PRIMARY KEY,
                main_numbers TEXT NOT NULL,
                bonus_number INTEGER NOT NULL,
                draw_number INTEGER,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_picks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                numbers TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn upsert_draw(&self, record: &DrawRecord) -> Result<Upsert> {
        Self::upsert_on(&self.conn, record)
    }

    /// Upsert a batch inside one transaction. Returns (inserted, updated).
    pub fn upsert_draws(&mut self, records: &[DrawRecord]) -> Result<(usize, usize)> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        let mut updated = 0;
        for record in records {
            match Self::upsert_on(&tx, record)? {
                Upsert::Inserted => inserted += 1,
                Upsert::Updated => updated += 1,
            }
        }
        tx.commit()?;
        Ok((inserted, updated))
    }

    pub fn draws_in_range(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DrawRecord>> {
        let start = start.map(|d| d.format(DATE_FMT).to_string());
        let end = end.map(|d| d.format(DATE_FMT).to_string());
        let mut stmt = self.conn.prepare(
            "SELECT draw_date, main_numbers, bonus_number, draw_number
             FROM winning_numbers
             WHERE (?1 IS NULL OR draw_date >= ?1)
               AND (?2 IS NULL OR draw_date <= ?2)
             ORDER BY draw_date DESC",
        )?;
        let rows = stmt.query_map((start, end), Self::row_to_record)?;
        rows.collect()
    }

    pub fn latest_draws(&self, limit: usize) -> Result<Vec<DrawRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT draw_date, main_numbers, bonus_number, draw_number
             FROM winning_numbers
             ORDER BY draw_date DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], Self::row_to_record)?;
        rows.collect()
    }

    pub fn add_pick(&self, pick: &UserPick) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO user_picks (numbers) VALUES (?1)",
            [numbers_to_text(&pick.numbers())],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn picks(&self) -> Result<Vec<UserPick>> {
        let mut stmt = self
            .conn
            .prepare("SELECT numbers FROM user_picks ORDER BY created_at DESC, id DESC")?;
        let rows = stmt.query_map([], |row| {
            let text: String = row.get(0)?;
            let numbers = numbers_from_text(&text, 0)?;
            UserPick::new(&numbers).map_err(|e| conversion_err(0, e))
        })?;
        rows.collect()
    }

    fn upsert_on(conn: &Connection, record: &DrawRecord) -> Result<Upsert> {
        let date = record.draw_date.format(DATE_FMT).to_string();
        let existed: bool = conn
            .query_row(
                "SELECT 1 FROM winning_numbers WHERE draw_date = ?1",
                [&date],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        conn.execute(
            "INSERT INTO winning_numbers (draw_date, main_numbers, bonus_number, draw_number)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(draw_date) DO UPDATE SET
                 main_numbers = excluded.main_numbers,
                 bonus_number = excluded.bonus_number,
                 draw_number = excluded.draw_number,
                 updated_at = CURRENT_TIMESTAMP",
            (
                &date,
                numbers_to_text(&record.main_numbers),
                record.bonus_number,
                record.draw_number,
            ),
        )?;
        Ok(if existed {
            Upsert::Updated
        } else {
            Upsert::Inserted
        })
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> Result<DrawRecord> {
        let date_text: String = row.get(0)?;
        let draw_date = NaiveDate::parse_from_str(&date_text, DATE_FMT)
            .map_err(|e| conversion_err(0, e))?;
        let numbers_text: String = row.get(1)?;
        let main_numbers = numbers_from_text(&numbers_text, 1)?;
        let bonus_number: u8 = row.get(2)?;
        let draw_number: Option<u32> = row.get(3)?;
        DrawRecord::new(draw_date, &main_numbers, bonus_number, draw_number)
            .map_err(|e| conversion_err(1, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, first: u8, bonus: u8) -> DrawRecord {
        DrawRecord::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            &[first, 10, 20, 30, 40, 43],
            bonus,
            Some(1900),
        )
        .unwrap()
    }

    #[test]
    fn upsert_inserts_then_overwrites() {
        let store = Store::open_in_memory().unwrap();
        let first = record("2024-05-10", 1, 5);
        assert_eq!(store.upsert_draw(&first).unwrap(), Upsert::Inserted);

        // Same date, different numbers: fields must be overwritten.
        let second = record("2024-05-10", 2, 7);
        assert_eq!(store.upsert_draw(&second).unwrap(), Upsert::Updated);

        let draws = store.latest_draws(10).unwrap();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].main_numbers[0], 2);
        assert_eq!(draws[0].bonus_number, 7);
    }

    #[test]
    fn batch_upsert_counts() {
        let mut store = Store::open_in_memory().unwrap();
        store.upsert_draw(&record("2024-05-06", 1, 5)).unwrap();
        let (inserted, updated) = store
            .upsert_draws(&[record("2024-05-06", 2, 6), record("2024-05-10", 3, 7)])
            .unwrap();
        assert_eq!((inserted, updated), (1, 1));
    }

    #[test]
    fn range_query_is_inclusive_and_descending() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .upsert_draws(&[
                record("2024-04-29", 1, 5),
                record("2024-05-06", 2, 6),
                record("2024-05-10", 3, 7),
                record("2024-05-13", 4, 8),
            ])
            .unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let draws = store.draws_in_range(Some(start), Some(end)).unwrap();
        let dates: Vec<String> = draws.iter().map(|r| r.draw_date.to_string()).collect();
        assert_eq!(dates, ["2024-05-10", "2024-05-06"]);

        let all = store.draws_in_range(None, None).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].draw_date.to_string(), "2024-05-13");
    }

    #[test]
    fn picks_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let pick = UserPick::new(&[1, 2, 3, 4, 5, 6]).unwrap();
        store.add_pick(&pick).unwrap();
        let picks = store.picks().unwrap();
        assert_eq!(picks, vec![pick]);
    }
}
