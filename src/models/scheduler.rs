//! Three-tier spaced repetition rule.
//!
//! Every review is rated Hard, Good or Easy:
//! - Easy grows the interval by the ease factor times the next review number and nudges EF up
//! - Good grows the interval by the ease factor times the reviews done so far and nudges EF down
//! - Hard always schedules the item for tomorrow and drops EF harder
//! - EF stays within [1.3, 2.5] and no interval is shorter than one day

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NiftyError;

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 2.5;

/// How well the user recalled an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Ratings in the order the review buttons show them.
    pub const ALL: [Rating; 3] = [Rating::Hard, Rating::Good, Rating::Easy];

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = NiftyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hard" => Ok(Rating::Hard),
            "good" => Ok(Rating::Good),
            "easy" => Ok(Rating::Easy),
            other => Err(NiftyError::validation(format!("unknown rating '{}'", other))),
        }
    }
}

/// Computes the interval in days until the next review and the new ease factor.
///
/// Intervals truncate toward zero before the one-day floor is applied, so
/// `Good` on an item that was never reviewed yields one day, same as `Hard`.
pub fn compute_next_state(review_count: u32, ease_factor: f64, rating: Rating) -> (u32, f64) {
    match rating {
        Rating::Easy => {
            let interval = (ease_factor * f64::from(review_count.saturating_add(1))) as u32;
            (interval.max(1), (ease_factor + 0.1).min(MAX_EASE_FACTOR))
        }
        Rating::Good => {
            let interval = (ease_factor * f64::from(review_count)) as u32;
            (interval.max(1), (ease_factor - 0.1).max(MIN_EASE_FACTOR))
        }
        Rating::Hard => (1, (ease_factor - 0.2).max(MIN_EASE_FACTOR)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_good_on_new_item_is_one_day() {
        assert_eq!(compute_next_state(0, 2.5, Rating::Good), (1, 2.4));
    }

    #[test]
    fn test_easy_at_ceiling() {
        assert_eq!(compute_next_state(3, 2.5, Rating::Easy), (10, 2.5));
    }

    #[test]
    fn test_hard_at_floor() {
        assert_eq!(compute_next_state(2, 1.3, Rating::Hard), (1, 1.3));
    }

    #[test]
    fn test_interval_truncates_instead_of_rounding() {
        // 1.9 * 3 = 5.7, truncated to 5
        let (interval, _) = compute_next_state(3, 1.9, Rating::Good);
        assert_eq!(interval, 5);

        // 1.9 * 4 = 7.6, truncated to 7
        let (interval, _) = compute_next_state(3, 1.9, Rating::Easy);
        assert_eq!(interval, 7);
    }

    #[test]
    fn test_hard_ignores_history() {
        let (interval, ease) = compute_next_state(40, 2.5, Rating::Hard);
        assert_eq!(interval, 1);
        assert!((ease - 2.3).abs() < 1e-9);
    }

    #[test]
    fn test_rating_parse_and_display() {
        assert_eq!("Easy".parse::<Rating>().unwrap(), Rating::Easy);
        assert_eq!(" good ".parse::<Rating>().unwrap(), Rating::Good);
        assert_eq!("HARD".parse::<Rating>().unwrap(), Rating::Hard);
        assert!("perfect".parse::<Rating>().is_err());

        for rating in Rating::ALL {
            assert_eq!(rating.to_string().parse::<Rating>().unwrap(), rating);
        }
    }

    fn any_rating() -> impl Strategy<Value = Rating> {
        prop_oneof![Just(Rating::Hard), Just(Rating::Good), Just(Rating::Easy)]
    }

    proptest! {
        #[test]
        fn prop_ease_stays_in_bounds(
            review_count in 0u32..10_000,
            ease in MIN_EASE_FACTOR..=MAX_EASE_FACTOR,
            rating in any_rating(),
        ) {
            let (_, new_ease) = compute_next_state(review_count, ease, rating);
            prop_assert!(new_ease >= MIN_EASE_FACTOR);
            prop_assert!(new_ease <= MAX_EASE_FACTOR);
        }

        #[test]
        fn prop_interval_is_at_least_one_day(
            review_count in 0u32..10_000,
            ease in MIN_EASE_FACTOR..=MAX_EASE_FACTOR,
            rating in any_rating(),
        ) {
            let (interval, _) = compute_next_state(review_count, ease, rating);
            prop_assert!(interval >= 1);
        }

        #[test]
        fn prop_easy_never_schedules_sooner_than_good(
            review_count in 0u32..10_000,
            ease in MIN_EASE_FACTOR..=MAX_EASE_FACTOR,
        ) {
            let (easy, _) = compute_next_state(review_count, ease, Rating::Easy);
            let (good, _) = compute_next_state(review_count, ease, Rating::Good);
            prop_assert!(easy >= good);
        }
    }
}
