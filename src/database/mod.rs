pub mod clock;
pub mod db;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::ItemStore;
