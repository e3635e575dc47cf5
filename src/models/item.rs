//! Item is a piece of text the user wants to remember, plus its review state.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ease factor every new item starts with.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Nullable in the schema, but every item created through the store has one.
    pub next_review: Option<DateTime<Utc>>,
    pub review_count: u32,
    pub ease_factor: f64,
}

impl Item {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review.is_some_and(|next| next <= now)
    }
}
