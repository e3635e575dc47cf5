pub mod item;
pub mod review_session;
pub mod scheduler;
pub mod stats;

pub use item::Item;
pub use review_session::{RateOutcome, ReviewSession, ReviewState};
pub use scheduler::{Rating, compute_next_state};
pub use stats::{ReviewStats, StatsAggregator};
