use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::RecordError;

/// Loto6 numbers are drawn from this inclusive range.
pub const NUMBER_MIN: u8 = 1;
pub const NUMBER_MAX: u8 = 43;
/// Six main numbers per drawing; the bonus number is drawn separately.
pub const MAIN_COUNT: usize = 6;

fn in_range(n: u8) -> bool {
    (NUMBER_MIN..=NUMBER_MAX).contains(&n)
}

/// Validate six picks: every value in [1,43], no duplicates.
/// Returns the values sorted ascending.
fn validate_six(numbers: &[u8]) -> Result<[u8; MAIN_COUNT], RecordError> {
    if numbers.len() != MAIN_COUNT {
        return Err(RecordError::WrongCount(numbers.len()));
    }
    let mut sorted = [0u8; MAIN_COUNT];
    sorted.copy_from_slice(numbers);
    sorted.sort_unstable();
    for (i, &n) in sorted.iter().enumerate() {
        if !in_range(n) {
            return Err(RecordError::OutOfRange(n));
        }
        if i > 0 && sorted[i - 1] == n {
            return Err(RecordError::Duplicate(n));
        }
    }
    Ok(sorted)
}

/// One lottery drawing as extracted from a results page (or imported in bulk).
///
/// `draw_date` is the unique key across the corpus — one drawing per date.
/// Construction goes through [`DrawRecord::new`], which enforces the validity
/// gate; a value of this type is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub draw_date: NaiveDate,
    /// Six distinct values in [1,43], ascending.
    pub main_numbers: [u8; MAIN_COUNT],
    /// May legitimately coincide with a main number; real draws never collide.
    pub bonus_number: u8,
    /// Sequential official draw index, when the markup yields one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_number: Option<u32>,
}

impl DrawRecord {
    pub fn new(
        draw_date: NaiveDate,
        main_numbers: &[u8],
        bonus_number: u8,
        draw_number: Option<u32>,
    ) -> Result<Self, RecordError> {
        let main_numbers = validate_six(main_numbers)?;
        if !in_range(bonus_number) {
            return Err(RecordError::BonusOutOfRange(bonus_number));
        }
        Ok(Self {
            draw_date,
            main_numbers,
            bonus_number,
            draw_number,
        })
    }

    pub fn contains_main(&self, n: u8) -> bool {
        self.main_numbers.contains(&n)
    }
}

impl fmt::Display for DrawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nums = self
            .main_numbers
            .iter()
            .map(|n| format!("{n:02}"))
            .collect::<Vec<_>>()
            .join(" ");
        match self.draw_number {
            Some(no) => write!(
                f,
                "{} (draw #{no}): {nums} ({:02})",
                self.draw_date, self.bonus_number
            ),
            None => write!(f, "{}: {nums} ({:02})", self.draw_date, self.bonus_number),
        }
    }
}

/// A user-registered guess: six distinct values in [1,43], held ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPick {
    numbers: [u8; MAIN_COUNT],
}

impl UserPick {
    pub fn new(numbers: &[u8]) -> Result<Self, RecordError> {
        Ok(Self {
            numbers: validate_six(numbers)?,
        })
    }

    pub fn numbers(&self) -> [u8; MAIN_COUNT] {
        self.numbers
    }

    pub fn contains(&self, n: u8) -> bool {
        self.numbers.contains(&n)
    }
}

impl fmt::Display for UserPick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nums = self
            .numbers
            .iter()
            .map(|n| format!("{n:02}"))
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&nums)
    }
}

/// Prize classification of one pick against one drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrizeTier {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Miss,
}

impl PrizeTier {
    pub fn is_win(self) -> bool {
        self != PrizeTier::Miss
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrizeTier::First => "1st prize",
            PrizeTier::Second => "2nd prize",
            PrizeTier::Third => "3rd prize",
            PrizeTier::Fourth => "4th prize",
            PrizeTier::Fifth => "5th prize",
            PrizeTier::Miss => "no win",
        }
    }
}

impl fmt::Display for PrizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output. Transient — regenerated on every check, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub tier: PrizeTier,
    pub match_count: usize,
    pub bonus_match: bool,
    /// The pick, ascending, for display.
    pub picked: [u8; MAIN_COUNT],
    pub draw: DrawRecord,
}
