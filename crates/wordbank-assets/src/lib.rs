//! Static data bundled into the client binary.

/// Fallback category dataset, shown when the categories endpoint is
/// unreachable or returns a non-success envelope.
///
/// JSON array of `Category` objects.
pub const CATEGORIES_JSON: &str = include_str!("../data/categories.json");

/// Commented template written by `wordbank config init`.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../data/default_config.toml");
