//! Prize-tier classification.
//!
//! Pure and total over validated inputs: the same `(pick, draw)` always
//! yields the same result. The bonus number only ever distinguishes 2nd
//! from 3rd prize.

use crate::core::types::{DrawRecord, MatchResult, PrizeTier, UserPick};

/// Classify one pick against one drawing.
///
/// Tier decision in priority order, first match wins:
/// 6 matches → 1st; 5 + bonus → 2nd; 5 → 3rd; 4 → 4th; 3 → 5th; else no win.
pub fn classify(pick: &UserPick, draw: &DrawRecord) -> MatchResult {
    let match_count = pick
        .numbers()
        .iter()
        .filter(|&&n| draw.contains_main(n))
        .count();
    let bonus_match = pick.contains(draw.bonus_number);

    let tier = match (match_count, bonus_match) {
        (6, _) => PrizeTier::First,
        (5, true) => PrizeTier::Second,
        (5, false) => PrizeTier::Third,
        (4, _) => PrizeTier::Fourth,
        (3, _) => PrizeTier::Fifth,
        _ => PrizeTier::Miss,
    };

    MatchResult {
        tier,
        match_count,
        bonus_match,
        picked: pick.numbers(),
        draw: draw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draw(main: [u8; 6], bonus: u8) -> DrawRecord {
        DrawRecord::new(
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            &main,
            bonus,
            Some(1900),
        )
        .unwrap()
    }

    fn pick(numbers: [u8; 6]) -> UserPick {
        UserPick::new(&numbers).unwrap()
    }

    #[test]
    fn all_six_is_first_prize() {
        let result = classify(&pick([1, 2, 3, 4, 5, 6]), &draw([1, 2, 3, 4, 5, 6], 7));
        assert_eq!(result.tier, PrizeTier::First);
        assert_eq!(result.match_count, 6);
    }

    #[test]
    fn five_plus_bonus_is_second_prize() {
        let result = classify(&pick([1, 2, 3, 4, 5, 9]), &draw([1, 2, 3, 4, 5, 6], 9));
        assert_eq!(result.tier, PrizeTier::Second);
        assert_eq!(result.match_count, 5);
        assert!(result.bonus_match);
    }

    #[test]
    fn five_without_bonus_is_third_prize() {
        let result = classify(&pick([1, 2, 3, 4, 5, 9]), &draw([1, 2, 3, 4, 5, 6], 7));
        assert_eq!(result.tier, PrizeTier::Third);
        assert_eq!(result.match_count, 5);
        assert!(!result.bonus_match);
    }

    #[test]
    fn four_is_fourth_prize() {
        let result = classify(&pick([1, 2, 3, 4, 10, 11]), &draw([1, 2, 3, 4, 5, 6], 7));
        assert_eq!(result.tier, PrizeTier::Fourth);
        assert_eq!(result.match_count, 4);
    }

    #[test]
    fn three_is_fifth_prize() {
        let result = classify(&pick([1, 2, 3, 10, 11, 12]), &draw([1, 2, 3, 4, 5, 6], 7));
        assert_eq!(result.tier, PrizeTier::Fifth);
    }

    #[test]
    fn zero_matches_is_no_win() {
        let result = classify(&pick([10, 11, 12, 13, 14, 15]), &draw([1, 2, 3, 4, 5, 6], 7));
        assert_eq!(result.tier, PrizeTier::Miss);
        assert_eq!(result.match_count, 0);
        assert!(!result.tier.is_win());
    }

    #[test]
    fn bonus_never_upgrades_below_five_matches() {
        // 4 matches + bonus stays 4th prize; the bonus only splits 2nd/3rd.
        let result = classify(&pick([1, 2, 3, 4, 9, 11]), &draw([1, 2, 3, 4, 5, 6], 9));
        assert_eq!(result.tier, PrizeTier::Fourth);
        assert!(result.bonus_match);
    }

    #[test]
    fn second_beats_third_regardless_of_input_order() {
        // Tie-break priority: matchCount=5 and bonusMatch=true is always 2nd.
        for permuted in [[9, 5, 4, 3, 2, 1], [5, 9, 1, 3, 2, 4]] {
            let result = classify(&pick(permuted), &draw([1, 2, 3, 4, 5, 6], 9));
            assert_eq!(result.tier, PrizeTier::Second);
        }
    }

    #[test]
    fn deterministic_and_sorted_for_display() {
        let p = pick([30, 20, 10, 3, 2, 1]);
        let d = draw([1, 2, 3, 4, 5, 6], 7);
        let a = classify(&p, &d);
        let b = classify(&p, &d);
        assert_eq!(a, b);
        assert_eq!(a.picked, [1, 2, 3, 10, 20, 30]);
    }
}
