//! Subscribable application state.
//!
//! ## State Hierarchy
//!
//! ```text
//! AppState
//! ├── auth: AuthSlice   (status, onboarding flag, auth error, preference sync)
//! └── game: GameSlice   (categories, lists, quiz, pagination, loading flags)
//! ```
//!
//! State lives behind a `tokio::sync::watch` channel. Only action functions
//! in [`crate::actions`] mutate it (through [`Store::update`]); the UI reads
//! snapshots or subscribes to a [`Selection`].

mod auth;
mod game;
mod quiz;

use std::sync::Arc;

use tokio::sync::watch;

pub use auth::{AuthSlice, AuthStatus, SyncStatus};
pub use game::{Entity, GameSlice, LoadingFlags, bundled_categories};
pub use quiz::{AnswerOutcome, QuizProgress, QuizScore};

/// Combined application state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub auth: AuthSlice,
    pub game: GameSlice,
}

/// Handle to the state container. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Store {
    tx: Arc<watch::Sender<AppState>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AppState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.tx.borrow().clone()
    }

    /// Reads part of the current state without cloning the rest.
    pub fn select<R>(&self, selector: impl FnOnce(&AppState) -> R) -> R {
        selector(&self.tx.borrow())
    }

    /// Subscribes to every state change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    /// Subscribes to changes of the value picked by `selector`.
    pub fn watch<R, F>(&self, selector: F) -> Selection<R, F>
    where
        R: Clone + PartialEq,
        F: Fn(&AppState) -> R,
    {
        let mut rx = self.tx.subscribe();
        let last = selector(&rx.borrow_and_update());
        Selection { rx, selector, last }
    }

    /// Applies `mutate` and notifies subscribers.
    pub(crate) fn update<R>(&self, mutate: impl FnOnce(&mut AppState) -> R) -> R {
        let mut out = None;
        self.tx.send_modify(|state| out = Some(mutate(state)));
        out.expect("send_modify runs its closure exactly once")
    }

    /// Drops all state back to defaults.
    pub(crate) fn reset(&self) {
        self.tx.send_replace(AppState::default());
    }
}

/// A selector subscription: yields only when the selected value changes.
pub struct Selection<R, F> {
    rx: watch::Receiver<AppState>,
    selector: F,
    last: R,
}

impl<R, F> Selection<R, F>
where
    R: Clone + PartialEq,
    F: Fn(&AppState) -> R,
{
    /// The most recently observed value.
    pub fn current(&self) -> &R {
        &self.last
    }

    /// Waits for the selected value to change.
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<R> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let next = (self.selector)(&self.rx.borrow_and_update());
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_selection_skips_unrelated_changes() {
        let store = Store::new();
        let mut onboarded = store.watch(|s| s.auth.has_onboarded);
        assert!(!*onboarded.current());

        let writer = store.clone();
        let handle = tokio::spawn(async move {
            writer.update(|s| s.game.error = Some("unrelated".into()));
            writer.update(|s| s.auth.has_onboarded = true);
        });

        let next = tokio::time::timeout(Duration::from_secs(1), onboarded.changed())
            .await
            .unwrap();
        assert_eq!(next, Some(true));
        handle.await.unwrap();
    }

    #[test]
    fn test_update_returns_closure_value() {
        let store = Store::new();
        let prev = store.update(|s| std::mem::replace(&mut s.auth.has_onboarded, true));
        assert!(!prev);
        assert!(store.select(|s| s.auth.has_onboarded));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let store = Store::new();
        store.update(|s| s.game.error = Some("boom".into()));
        store.reset();
        assert!(store.snapshot().game.error.is_none());
    }
}
