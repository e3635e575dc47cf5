//! Error types shared by the store, the review controller and the shell.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NiftyError {
    /// Content rejected before it reached the database.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A review update referenced an item id the store does not hold.
    #[error("item not found: {id}")]
    NotFound { id: i64 },

    /// SQLite failure while opening, migrating or querying the store.
    #[error("persistence error: {source}")]
    Persistence {
        #[from]
        source: rusqlite::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("hotkey error: {message}")]
    Hotkey { message: String },
}

pub type Result<T> = std::result::Result<T, NiftyError>;

impl NiftyError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn hotkey(message: impl Into<String>) -> Self {
        Self::Hotkey {
            message: message.into(),
        }
    }
}
