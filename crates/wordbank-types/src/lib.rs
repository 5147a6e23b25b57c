//! Wire and domain types shared by the Wordbank client crates.

pub mod envelope;
pub mod lists;
pub mod quiz;
pub mod user;

pub use envelope::{AuthPayload, Envelope, EnvelopeFailure, Page, PageInfo, RefreshResponse};
pub use lists::{Category, Word, WordList};
pub use quiz::Question;
pub use user::{PreferencesPatch, StatsPatch, Theme, User, UserPreferences, UserStats};
