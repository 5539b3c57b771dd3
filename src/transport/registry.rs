//! Transport factory/registry (§4.2): binds a URL scheme to exactly one
//! implementation for the process lifetime, idempotently and thread-safely.
//!
//! Grounded on `gofer.transport.factory.Transport`, which caches bindings
//! in a class-level `packages` dict keyed by URL. Reimplemented as an
//! explicit, instance-owned registry rather than a process-global map,
//! in the same spirit as the decorator-registry rework in §9 ("removing
//! module-level mutable state").

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;

// Layer 3: Internal module imports
use super::error::TransportError;
use super::memory::InMemoryTransportFactory;
use super::model::{Destination, QueueSpec};
use super::traits::{Broker, Producer, Queue, Reader};

/// Produces the producer/reader/queue/broker family bound to one scheme
/// (§4.2: "`Transport(url)`" binds a URL to exactly one such family).
pub trait TransportFactory: Send + Sync {
    /// The URL scheme this factory serves, e.g. `"memory"`.
    fn scheme(&self) -> &str;
    fn broker(&self) -> Box<dyn Broker>;
    fn queue(&self, spec: QueueSpec) -> Arc<dyn Queue>;
    fn producer(&self) -> Arc<dyn Producer>;
    fn reader(&self, destination: Destination) -> Arc<dyn Reader>;
}

/// Binds URLs to [`TransportFactory`] implementations, one per scheme,
/// for the lifetime of the registry.
pub struct TransportRegistry {
    bindings: DashMap<String, Arc<dyn TransportFactory>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }

    /// A registry pre-bound with the in-process reference transport
    /// under the `memory://` scheme, for tests and single-process demos.
    pub fn with_memory_transport() -> Self {
        let registry = Self::new();
        registry
            .bind("memory", Arc::new(InMemoryTransportFactory::new()))
            .expect("fresh registry never conflicts");
        registry
    }

    /// Bind `scheme` to `factory`. Idempotent: binding the same scheme to
    /// an `Arc`-equal factory again is a no-op; binding it to a different
    /// factory is a [`TransportError::BindConflict`].
    pub fn bind(
        &self,
        scheme: impl Into<String>,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<(), TransportError> {
        let scheme = scheme.into();
        match self.bindings.entry(scheme.clone()) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(factory);
                Ok(())
            }
            dashmap::mapref::entry::Entry::Occupied(slot) => {
                if Arc::ptr_eq(slot.get(), &factory) {
                    Ok(())
                } else {
                    Err(TransportError::BindConflict { url: scheme })
                }
            }
        }
    }

    /// Resolve the scheme portion of `url` (the substring before `://`)
    /// to its bound factory.
    pub fn resolve(&self, url: &str) -> Result<Arc<dyn TransportFactory>, TransportError> {
        let scheme = url.split("://").next().unwrap_or(url);
        self.bindings
            .get(scheme)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| TransportError::UnknownScheme {
                scheme: scheme.to_string(),
            })
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_bound_scheme() {
        let registry = TransportRegistry::with_memory_transport();
        assert!(registry.resolve("memory://localhost").is_ok());
    }

    #[test]
    fn unknown_scheme_errors() {
        let registry = TransportRegistry::new();
        assert!(matches!(
            registry.resolve("amqp://localhost"),
            Err(TransportError::UnknownScheme { .. })
        ));
    }

    #[test]
    fn rebinding_same_factory_is_idempotent() {
        let registry = TransportRegistry::new();
        let factory: Arc<dyn TransportFactory> = Arc::new(InMemoryTransportFactory::new());
        assert!(registry.bind("memory", Arc::clone(&factory)).is_ok());
        assert!(registry.bind("memory", factory).is_ok());
    }

    #[test]
    fn rebinding_different_factory_conflicts() {
        let registry = TransportRegistry::new();
        registry
            .bind("memory", Arc::new(InMemoryTransportFactory::new()))
            .unwrap();
        let err = registry.bind("memory", Arc::new(InMemoryTransportFactory::new()));
        assert!(matches!(err, Err(TransportError::BindConflict { .. })));
    }
}
