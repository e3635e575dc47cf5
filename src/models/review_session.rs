//! Review session: fetch the next due item, wait for a rating, write it back.
//! Rating an item moves straight on to the next one that is due.

use super::scheduler::{Rating, compute_next_state};
use super::Item;
use crate::database::db::ItemStore;
use crate::error::Result;

/// What the session is doing right now.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ReviewState {
    /// No item is held.
    #[default]
    Idle,
    /// A copy of a due item is shown and awaits a rating.
    Presenting(Item),
}

/// Result of a rating request.
#[derive(Clone, Debug, PartialEq)]
pub enum RateOutcome {
    /// There was no item to rate, nothing was written.
    NothingHeld,
    Rated {
        item_id: i64,
        rating: Rating,
        interval_days: u32,
        ease_factor: f64,
        /// Whether another due item is now presented.
        has_next: bool,
        /// Set when the rating was saved but loading the next item failed.
        next_error: Option<String>,
    },
}

#[derive(Debug, Default)]
pub struct ReviewSession {
    state: ReviewState,
    reviewed: usize,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    pub fn current_item(&self) -> Option<&Item> {
        match &self.state {
            ReviewState::Presenting(item) => Some(item),
            ReviewState::Idle => None,
        }
    }

    pub fn is_presenting(&self) -> bool {
        matches!(self.state, ReviewState::Presenting(_))
    }

    /// Number of ratings recorded through this session.
    pub fn reviewed_count(&self) -> usize {
        self.reviewed
    }

    /// Fetches the next due item. `None` means nothing is due and the session is idle.
    pub fn start_review(&mut self, store: &ItemStore) -> Result<Option<&Item>> {
        self.state = match store.get_due_item()? {
            Some(item) => {
                log::debug!("Presenting item {}", item.id);
                ReviewState::Presenting(item)
            }
            None => ReviewState::Idle,
        };
        Ok(self.current_item())
    }

    /// Rates the held item, stores the new schedule and advances to the next due item.
    ///
    /// Without a held item this does nothing. If the store rejects the update
    /// the error is returned and the same item stays held. Once the update is
    /// written the result is always `Ok(Rated)`: a failure to fetch the next
    /// item leaves the session idle and is reported in `next_error`.
    pub fn rate(&mut self, store: &ItemStore, rating: Rating) -> Result<RateOutcome> {
        let ReviewState::Presenting(item) = &self.state else {
            log::debug!("Ignoring {} rating, no item under review", rating);
            return Ok(RateOutcome::NothingHeld);
        };

        let item_id = item.id;
        let (interval_days, ease_factor) =
            compute_next_state(item.review_count, item.ease_factor, rating);
        let review_count = item.review_count.saturating_add(1);

        store.update_item_review(item_id, review_count, ease_factor, interval_days)?;

        self.state = ReviewState::Idle;
        self.reviewed += 1;

        let (has_next, next_error) = match self.start_review(store) {
            Ok(next) => (next.is_some(), None),
            Err(e) => {
                log::warn!("Rated item {} but could not load the next one: {}", item_id, e);
                self.state = ReviewState::Idle;
                (false, Some(e.to_string()))
            }
        };

        Ok(RateOutcome::Rated {
            item_id,
            rating,
            interval_days,
            ease_factor,
            has_next,
            next_error,
        })
    }
}
