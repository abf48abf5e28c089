//! Errors raised by the timer store and its persistence layer.
//!
//! Empty titles and non-positive durations are not errors: the store
//! defaults or discards them silently.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The durable store could not complete a read or write.
    #[error("Persistence unavailable during {operation}: {source}")]
    PersistenceUnavailable {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A stored row could not be decoded into the data model.
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn unavailable(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| StoreError::PersistenceUnavailable { operation, source }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::PersistenceUnavailable { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
