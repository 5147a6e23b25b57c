//! Diagnostic error log and the top-level error boundary.
//!
//! The log keeps the most recent [`ERROR_LOG_CAPACITY`] entries in device
//! storage, oldest evicted first.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::storage::{SharedStorage, StorageError, keys};

pub const ERROR_LOG_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Bounded error log persisted under [`keys::ERROR_LOG`].
#[derive(Clone)]
pub struct ErrorLog {
    storage: SharedStorage,
}

impl std::fmt::Debug for ErrorLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLog").finish_non_exhaustive()
    }
}

impl ErrorLog {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Returns the retained entries, oldest first.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read or the log is corrupt.
    pub async fn entries(&self) -> Result<Vec<ErrorEntry>, StorageError> {
        match self.storage.get(keys::ERROR_LOG).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Appends an entry, evicting the oldest beyond capacity.
    ///
    /// A corrupt log is discarded and started afresh.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read or written.
    pub async fn record(&self, message: impl Into<String>) -> Result<(), StorageError> {
        let mut entries = match self.entries().await {
            Ok(entries) => entries,
            Err(StorageError::Serde(e)) => {
                warn!("discarding corrupt error log: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        entries.push(ErrorEntry {
            at: Utc::now(),
            message: message.into(),
        });
        if entries.len() > ERROR_LOG_CAPACITY {
            let excess = entries.len() - ERROR_LOG_CAPACITY;
            entries.drain(..excess);
        }

        let raw = serde_json::to_string(&entries)?;
        self.storage.set(keys::ERROR_LOG, &raw).await
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::ERROR_LOG).await
    }
}

/// Outcome of running UI code under an [`ErrorBoundary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryOutcome<T> {
    Rendered(T),
    /// The closure panicked. The UI offers retry (call `guard` again) or
    /// reset (`AppContext::reset_app_data`).
    Failed { message: String },
}

/// Catches panics from UI code and records them in the error log.
#[derive(Debug, Clone)]
pub struct ErrorBoundary {
    log: ErrorLog,
}

impl ErrorBoundary {
    pub fn new(log: ErrorLog) -> Self {
        Self { log }
    }

    /// Runs `render`, converting a panic into [`BoundaryOutcome::Failed`].
    pub async fn guard<T>(&self, render: impl FnOnce() -> T) -> BoundaryOutcome<T> {
        match panic::catch_unwind(AssertUnwindSafe(render)) {
            Ok(value) => BoundaryOutcome::Rendered(value),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("render failed: {message}");
                if let Err(e) = self.log.record(message.clone()).await {
                    warn!("could not record render failure: {e}");
                }
                BoundaryOutcome::Failed { message }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_log_keeps_most_recent_ten() {
        let log = ErrorLog::new(MemoryStore::shared());
        for i in 0..15 {
            log.record(format!("error {i}")).await.unwrap();
        }

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), ERROR_LOG_CAPACITY);
        assert_eq!(entries.first().unwrap().message, "error 5");
        assert_eq!(entries.last().unwrap().message, "error 14");
    }

    #[tokio::test]
    async fn test_corrupt_log_is_replaced() {
        let storage = MemoryStore::shared();
        storage.set(keys::ERROR_LOG, "{oops").await.unwrap();
        let log = ErrorLog::new(storage);

        log.record("fresh").await.unwrap();
        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "fresh");
    }

    #[tokio::test]
    async fn test_boundary_captures_panic() {
        let log = ErrorLog::new(MemoryStore::shared());
        let boundary = ErrorBoundary::new(log.clone());

        let outcome: BoundaryOutcome<()> = boundary
            .guard(|| panic!("list screen exploded"))
            .await;
        assert_eq!(
            outcome,
            BoundaryOutcome::Failed {
                message: "list screen exploded".into()
            }
        );
        assert_eq!(log.entries().await.unwrap().len(), 1);

        let retried = boundary.guard(|| 42).await;
        assert_eq!(retried, BoundaryOutcome::Rendered(42));
    }
}
