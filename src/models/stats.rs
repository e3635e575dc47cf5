//! Aggregate numbers shown on the statistics tab.
use crate::database::db::ItemStore;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total: u64,
    pub due: u64,
    /// Mean review count over all items, `0.0` for an empty store.
    pub average_review_count: f64,
}

impl fmt::Display for ReviewStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Items: {}", self.total)?;
        writeln!(f, "Items Due for Review: {}", self.due)?;
        write!(f, "Average Reviews per Item: {:.1}", self.average_review_count)
    }
}

/// Read-only view over the store's statistics.
pub struct StatsAggregator<'a> {
    store: &'a ItemStore,
}

impl<'a> StatsAggregator<'a> {
    pub fn new(store: &'a ItemStore) -> Self {
        Self { store }
    }

    pub fn get_stats(&self) -> Result<ReviewStats> {
        self.store.get_stats()
    }
}
