pub mod config;
pub mod database;
pub mod error;
pub mod hotkey;
pub mod models;

pub use database::ItemStore;
pub use error::{NiftyError, Result};
pub use models::{Item, Rating, ReviewSession, ReviewStats};
