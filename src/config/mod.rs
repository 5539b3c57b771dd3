//! Typed config reading (§4.10, component C10): an INI-style parser
//! feeding a dotted-lookup [`Graph`], merged under a schema.

pub mod error;
pub mod graph;
pub mod parser;
pub mod schema;

pub use error::ConfigError;
pub use graph::{Graph, Section};
pub use schema::{Property, PropertyType, Schema, SectionSchema};

// Layer 1: Standard library imports
use std::path::Path;

/// `Config(defaults, path)`: parse `path`, then layer it over
/// `defaults` (user values win, defaults fill gaps).
pub struct Config;

impl Config {
    pub async fn load(defaults: Graph, path: impl AsRef<Path>) -> Result<Graph, ConfigError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let user = parser::parse(&text)?;
        Ok(user.merge_under(defaults))
    }

    /// Same as [`Config::load`] but from an in-memory string, for
    /// tests and descriptors already read off disk by the caller.
    pub fn load_str(defaults: Graph, text: &str) -> Result<Graph, ConfigError> {
        let user = parser::parse(text)?;
        Ok(user.merge_under(defaults))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_str_merges_defaults_under_user_values() {
        let mut defaults = Graph::new();
        defaults.set("main", "enabled", "false");
        defaults.set("main", "threads", "1");
        let merged = Config::load_str(defaults, "[main]\nenabled = true\n").unwrap();
        assert_eq!(merged.get("main", "enabled"), Some("true"));
        assert_eq!(merged.get("main", "threads"), Some("1"));
    }
}
