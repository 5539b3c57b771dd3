//! Plugin model errors (§4.8).

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::config::ConfigError;
use crate::consumer::ConsumerError;
use crate::dispatcher::DispatchError;
use crate::pending::PendingError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("dependency cycle among plugins: {0:?}")]
    DependencyCycle(Vec<String>),

    #[error("plugin {name:?} extends unknown plugin {target:?}")]
    ExtendTargetNotFound { name: String, target: String },

    #[error("no registered module named {0:?}")]
    ModuleNotFound(String),

    #[error("plugin {0:?} is already loaded")]
    AlreadyLoaded(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Consumer(#[from] ConsumerError),

    #[error(transparent)]
    Pending(#[from] PendingError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl PluginError {
    /// A cycle or a bad `extends` target invalidates the whole load
    /// order and is fatal to the agent startup (§4.8 DepList feeds a
    /// process-wide sort); everything else isolates to one plugin
    /// (§4.8 "one bad plugin does not block others").
    pub fn is_fatal(&self) -> bool {
        matches!(self, PluginError::DependencyCycle(_))
    }
}
