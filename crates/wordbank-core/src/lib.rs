//! Wordbank client core: token storage, authenticated API access, the
//! application state container and the actions that drive it.

pub mod actions;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod diagnostics;
pub mod storage;
pub mod store;
pub mod tokens;

pub use actions::AppContext;
pub use bootstrap::Route;
