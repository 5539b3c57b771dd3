//! Plugin discovery and load ordering (§4.8).
//!
//! REDESIGN FLAGS (§9): the original locates a plugin's code by
//! importing a Python module off a search path. Rust has no dynamic
//! import; a [`ModuleRegistry`] of statically linked [`PluginModule`]
//! implementations, looked up by the name in `[main].plugin`, is the
//! idiomatic analog — every plugin's code ships in the same binary and
//! registers itself before [`PluginLoader::load`] runs.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tracing::{error, warn};

// Layer 3: Internal module imports
use crate::dispatcher::RemoteCollector;

use super::deplist::DepList;
use super::descriptor::PluginDescriptor;
use super::error::PluginError;
use super::model::Plugin;

/// One plugin's compiled-in code: populates a [`RemoteCollector`] with
/// its remotes and runs any `@initializer`-equivalent setup against the
/// freshly built [`Plugin`] (§4.8 "drains the registries into the
/// plugin... runs user initializer functions").
pub trait PluginModule: Send + Sync {
    fn populate(&self, collector: &mut RemoteCollector);

    /// Runs once, after the plugin's dispatcher is populated and (if
    /// `extends` is set) merged into its parent.
    fn initialize(&self, _plugin: &Plugin) {}
}

/// Binds a plugin name (`[main].plugin`, falling back to the
/// descriptor's own name) to its compiled-in [`PluginModule`].
#[derive(Default)]
pub struct ModuleRegistry {
    modules: DashMap<String, Arc<dyn PluginModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, module: Arc<dyn PluginModule>) {
        self.modules.insert(name.into(), module);
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn PluginModule>> {
        self.modules.get(name).map(|entry| Arc::clone(entry.value()))
    }
}

/// Loads a sorted list of descriptors into live [`Plugin`]s (§4.8
/// `PluginLoader.load`).
pub struct PluginLoader {
    modules: ModuleRegistry,
}

impl PluginLoader {
    pub fn new(modules: ModuleRegistry) -> Self {
        Self { modules }
    }

    /// Sort `descriptors` by declared dependency, then load each
    /// enabled one in order. A module import failure (no registered
    /// [`PluginModule`] for its name) unregisters that plugin and is
    /// isolated — the loop continues (§4.8 "one bad plugin does not
    /// block others"). Only a dependency cycle aborts the whole batch.
    pub fn load(&self, descriptors: Vec<(String, PluginDescriptor)>) -> Result<Vec<Arc<Plugin>>, PluginError> {
        let mut dl = DepList::new();
        for (name, descriptor) in &descriptors {
            dl.add(name.clone(), descriptor.dependencies());
        }
        let order = dl.sort()?;

        let mut built: Vec<(String, Arc<Plugin>)> = Vec::new();
        let index: std::collections::HashMap<&str, &PluginDescriptor> =
            descriptors.iter().map(|(n, d)| (n.as_str(), d)).collect();

        for name in order {
            let Some(descriptor) = index.get(name.as_str()) else {
                // A dependency-only leaf with no descriptor of its own
                // (e.g. an external/system plugin referenced by
                // `requires`) — nothing to load.
                continue;
            };
            if !descriptor.enabled() {
                continue;
            }
            match self.load_one(&name, descriptor, &built) {
                Ok(plugin) => built.push((name.clone(), plugin)),
                Err(err) => {
                    error!(plugin = %name, error = %err, "plugin load failed; skipped");
                }
            }
        }

        Ok(built.into_iter().map(|(_, plugin)| plugin).collect())
    }

    fn load_one(
        &self,
        name: &str,
        descriptor: &PluginDescriptor,
        already_built: &[(String, Arc<Plugin>)],
    ) -> Result<Arc<Plugin>, PluginError> {
        let module_name = descriptor.plugin_module().unwrap_or(name);
        let module = self.modules.find(module_name).ok_or_else(|| PluginError::ModuleNotFound(module_name.to_string()))?;

        let plugin = Arc::new(Plugin::new(name.to_string(), descriptor.clone()));
        let mut collector = RemoteCollector::new();
        module.populate(&mut collector);
        collector.drain_into(plugin.dispatcher().as_ref())?;

        if let Some(extends) = descriptor.extends() {
            let parent = already_built
                .iter()
                .find(|(n, _)| n == extends)
                .map(|(_, p)| Arc::clone(p))
                .ok_or_else(|| PluginError::ExtendTargetNotFound {
                    name: name.to_string(),
                    target: extends.to_string(),
                })?;
            plugin.extend_into(&parent)?;
        }

        module.initialize(&plugin);
        Ok(plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dispatcher::{RemoteFn, Return};
    use crate::plugin::descriptor::defaults;
    use serde_json::json;

    struct EchoModule;

    impl PluginModule for EchoModule {
        fn populate(&self, collector: &mut RemoteCollector) {
            collector.register(
                "TestAdmin",
                "echo",
                Arc::new(RemoteFn::new(|args: &[serde_json::Value], _kws, _progress| {
                    let args = args.to_vec();
                    async move { Return::success(args.first().cloned().unwrap_or(json!(null))) }
                })),
            );
        }
    }

    fn descriptor(text: &str) -> PluginDescriptor {
        let graph = Config::load_str(defaults(), text).unwrap();
        PluginDescriptor::new(graph).unwrap()
    }

    #[test]
    fn loads_enabled_plugin_with_registered_module() {
        let modules = ModuleRegistry::new();
        modules.register("demo", Arc::new(EchoModule));
        let loader = PluginLoader::new(modules);

        let plugins = loader
            .load(vec![("demo".to_string(), descriptor("[main]\nname = demo\n"))])
            .unwrap();
        assert_eq!(plugins.len(), 1);
        assert!(!plugins[0].dispatcher().is_empty());
    }

    #[test]
    fn missing_module_is_skipped_not_fatal() {
        let loader = PluginLoader::new(ModuleRegistry::new());
        let plugins = loader
            .load(vec![("demo".to_string(), descriptor("[main]\nname = demo\n"))])
            .unwrap();
        assert!(plugins.is_empty());
    }

    #[test]
    fn disabled_plugin_is_skipped() {
        let modules = ModuleRegistry::new();
        modules.register("demo", Arc::new(EchoModule));
        let loader = PluginLoader::new(modules);
        let plugins = loader
            .load(vec![("demo".to_string(), descriptor("[main]\nname = demo\nenabled = false\n"))])
            .unwrap();
        assert!(plugins.is_empty());
    }

    #[test]
    fn extends_merges_into_already_built_parent() {
        let modules = ModuleRegistry::new();
        modules.register("base", Arc::new(EchoModule));
        modules.register("child", Arc::new(EchoModule));
        let loader = PluginLoader::new(modules);

        let plugins = loader
            .load(vec![
                ("base".to_string(), descriptor("[main]\nname = base\n")),
                ("child".to_string(), descriptor("[main]\nname = child\nextends = base\n")),
            ])
            .unwrap();
        assert_eq!(plugins.len(), 2);
    }

    #[test]
    fn dependency_cycle_aborts_whole_batch() {
        let loader = PluginLoader::new(ModuleRegistry::new());
        let err = loader
            .load(vec![
                ("a".to_string(), descriptor("[main]\nname = a\nrequires = b\n")),
                ("b".to_string(), descriptor("[main]\nname = b\nrequires = a\n")),
            ])
            .unwrap_err();
        assert!(matches!(err, PluginError::DependencyCycle(_)));
    }
}
