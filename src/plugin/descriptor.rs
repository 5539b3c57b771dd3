//! `PluginDescriptor` (§3, §4.8): the typed view over a plugin's
//! parsed `[main]`/`[messaging]`/`[queue]` config sections.

// Layer 3: Internal module imports
use crate::config::{Graph, Property, PropertyType, Schema, SectionSchema};

use super::error::PluginError;

/// The schema every plugin `.conf` is validated against before a
/// [`PluginDescriptor`] is built from it (§4.8 step 2).
pub fn schema() -> Schema {
    Schema::new(vec![
        SectionSchema::required(
            "main",
            vec![
                Property::optional("name", PropertyType::Str),
                Property::optional("enabled", PropertyType::Bool),
                Property::optional("requires", PropertyType::List),
                Property::optional("extends", PropertyType::Str),
                Property::optional("plugin", PropertyType::Str),
            ],
        ),
        SectionSchema::optional(
            "messaging",
            vec![
                Property::optional("uuid", PropertyType::Str),
                Property::optional("url", PropertyType::Str),
                Property::optional("threads", PropertyType::Int),
                Property::optional("cacert", PropertyType::Str),
                Property::optional("clientcert", PropertyType::Str),
                Property::optional("host_validation", PropertyType::Bool),
            ],
        ),
        SectionSchema::optional("queue", vec![Property::optional("managed", PropertyType::Bool)]),
    ])
}

/// Default values layered under every user-supplied plugin config
/// (§4.8 `PLUGIN_DEFAULTS`).
pub fn defaults() -> Graph {
    let mut graph = Graph::new();
    graph.set("main", "enabled", "true");
    graph.set("messaging", "threads", "1");
    graph.set("messaging", "host_validation", "true");
    graph.set("queue", "managed", "true");
    graph
}

/// Typed view over one plugin's validated [`Graph`].
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    graph: Graph,
}

impl PluginDescriptor {
    /// Validate `graph` against [`schema`] and wrap it.
    pub fn new(graph: Graph) -> Result<Self, PluginError> {
        schema().validate(&graph)?;
        Ok(Self { graph })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn name(&self) -> Option<&str> {
        self.graph.get("main", "name")
    }

    pub fn enabled(&self) -> bool {
        self.graph.get_bool("main", "enabled").ok().flatten().unwrap_or(true)
    }

    pub fn requires(&self) -> Vec<String> {
        self.graph.get_list("main", "requires")
    }

    pub fn extends(&self) -> Option<&str> {
        self.graph.get("main", "extends")
    }

    pub fn plugin_module(&self) -> Option<&str> {
        self.graph.get("main", "plugin")
    }

    pub fn uuid(&self) -> Option<&str> {
        self.graph.get("messaging", "uuid")
    }

    pub fn url(&self) -> Option<&str> {
        self.graph.get("messaging", "url")
    }

    pub fn threads(&self) -> usize {
        self.graph
            .get_int("messaging", "threads")
            .ok()
            .flatten()
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }

    pub fn cacert(&self) -> Option<&str> {
        self.graph.get("messaging", "cacert")
    }

    pub fn clientcert(&self) -> Option<&str> {
        self.graph.get("messaging", "clientcert")
    }

    pub fn host_validation(&self) -> bool {
        self.graph.get_bool("messaging", "host_validation").ok().flatten().unwrap_or(true)
    }

    pub fn managed(&self) -> bool {
        self.graph.get_bool("queue", "managed").ok().flatten().unwrap_or(true)
    }

    /// Combined dependency set this descriptor must load after: its
    /// declared `requires` plus its `extends` target, if any (§4.8
    /// `__requires`).
    pub fn dependencies(&self) -> Vec<String> {
        let mut deps = self.requires();
        if let Some(extends) = self.extends() {
            if !deps.iter().any(|d| d == extends) {
                deps.push(extends.to_string());
            }
        }
        deps
    }
}
