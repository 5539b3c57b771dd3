//! The dispatcher table and the per-load `Remote` collector (§4.4, §9
//! "Decorator registries").
//!
//! The original source stages decorated callables in a process-global
//! registry that plugin import clears and repopulates each time. This
//! reimplementation makes that staging area an explicit, owned value —
//! a [`RemoteCollector`] — that one plugin-load pass populates and then
//! drains into a [`Dispatcher`], with no module-level mutable state.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;

// Layer 3: Internal module imports
use super::error::DispatchError;
use super::model::{RemoteConstraints, Return};
use super::progress::ProgressReporter;
use super::traits::Remote;
use crate::envelope::Request;

struct ClassBinding {
    methods: HashMap<String, (Arc<dyn Remote>, RemoteConstraints)>,
}

impl ClassBinding {
    fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }
}

/// Agent-side routing table from `classname.method` to callable (§4.4).
pub struct Dispatcher {
    classes: DashMap<String, ClassBinding>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            classes: DashMap::new(),
        }
    }

    /// Register one callable, failing if the pair is already bound.
    pub fn register(
        &self,
        classname: impl Into<String>,
        method: impl Into<String>,
        remote: Arc<dyn Remote>,
        constraints: RemoteConstraints,
    ) -> Result<(), DispatchError> {
        let classname = classname.into();
        let method = method.into();
        let mut binding = self.classes.entry(classname.clone()).or_insert_with(ClassBinding::new);
        if binding.methods.contains_key(&method) {
            return Err(DispatchError::AlreadyRegistered { classname, method });
        }
        binding.methods.insert(method, (remote, constraints));
        Ok(())
    }

    /// The constraints registered for `classname.method`, if bound.
    pub fn constraints(&self, classname: &str, method: &str) -> Option<RemoteConstraints> {
        self.classes
            .get(classname)
            .and_then(|binding| binding.methods.get(method).map(|(_, c)| c.clone()))
    }

    /// Resolve, validate arity, and invoke (§4.4 steps 1-4). Never
    /// returns an `Err` — resolution and arity failures are themselves
    /// packaged as [`Return::Exception`], matching "all user exceptions
    /// are captured into `Return.exval` — never propagated out" (§7).
    pub async fn dispatch(&self, request: &Request, progress: &dyn ProgressReporter) -> Return {
        let Some(binding) = self.classes.get(&request.classname) else {
            return Return::from(DispatchError::NotFound {
                classname: request.classname.clone(),
                method: request.method.clone(),
            });
        };
        let Some((remote, _constraints)) = binding.methods.get(&request.method) else {
            return Return::from(DispatchError::NotFound {
                classname: request.classname.clone(),
                method: request.method.clone(),
            });
        };
        let (min, max) = remote.arity();
        let got = request.args.len();
        if got < min || max.is_some_and(|max| got > max) {
            return Return::from(DispatchError::ArityMismatch {
                classname: request.classname.clone(),
                method: request.method.clone(),
                expected_min: min,
                expected_max: max,
                got,
            });
        }
        remote.invoke(&request.args, &request.kws, progress).await
    }

    /// `extends` (§4.4): copy every entry from `self` into `parent`
    /// under the parent's identity, i.e. keyed by `self`'s own
    /// classnames inserted directly into `parent`'s table.
    pub fn extend_into(&self, parent: &Dispatcher) -> Result<(), DispatchError> {
        for entry in self.classes.iter() {
            let classname = entry.key().clone();
            for (method, (remote, constraints)) in entry.value().methods.iter() {
                parent.register(classname.clone(), method.clone(), Arc::clone(remote), constraints.clone())?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl From<DispatchError> for Return {
    fn from(err: DispatchError) -> Self {
        Return::exception(dispatch_error_class(&err), err.to_string())
    }
}

fn dispatch_error_class(err: &DispatchError) -> &'static str {
    match err {
        DispatchError::NotFound { .. } => "NotFound",
        DispatchError::ArityMismatch { .. } => "ArityMismatch",
        DispatchError::AlreadyRegistered { .. } => "AlreadyRegistered",
    }
}

/// Per-load staging area populated while a plugin's code is being
/// imported, then drained into that plugin's [`Dispatcher`] (§9).
#[derive(Default)]
pub struct RemoteCollector {
    entries: Vec<(String, String, Arc<dyn Remote>, RemoteConstraints)>,
}

impl RemoteCollector {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn register(&mut self, classname: impl Into<String>, method: impl Into<String>, remote: Arc<dyn Remote>) {
        self.entries
            .push((classname.into(), method.into(), remote, RemoteConstraints::default()));
    }

    pub fn register_constrained(
        &mut self,
        classname: impl Into<String>,
        method: impl Into<String>,
        remote: Arc<dyn Remote>,
        constraints: RemoteConstraints,
    ) {
        self.entries.push((classname.into(), method.into(), remote, constraints));
    }

    /// Drain every collected entry into `dispatcher`.
    pub fn drain_into(self, dispatcher: &Dispatcher) -> Result<(), DispatchError> {
        for (classname, method, remote, constraints) in self.entries {
            dispatcher.register(classname, method, remote, constraints)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::progress::NullProgressReporter;
    use crate::dispatcher::traits::RemoteFn;
    use serde_json::json;

    fn echo_remote() -> Arc<dyn Remote> {
        Arc::new(RemoteFn::new(|args: &[serde_json::Value], _kws, _progress| {
            let args = args.to_vec();
            async move { Return::success(args.first().cloned().unwrap_or(serde_json::Value::Null)) }
        }))
    }

    #[tokio::test]
    async fn dispatches_registered_method() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register("TestAdmin", "echo", echo_remote(), RemoteConstraints::default())
            .unwrap();
        let request = Request::new("TestAdmin", "echo").with_args(vec![json!("hi")]);
        let result = dispatcher.dispatch(&request, &NullProgressReporter).await;
        assert_eq!(result, Return::success(json!("hi")));
    }

    #[tokio::test]
    async fn unknown_class_is_not_found() {
        let dispatcher = Dispatcher::new();
        let request = Request::new("Nope", "echo");
        let result = dispatcher.dispatch(&request, &NullProgressReporter).await;
        assert!(result.is_exception());
    }

    #[test]
    fn double_registration_fails() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register("TestAdmin", "echo", echo_remote(), RemoteConstraints::default())
            .unwrap();
        let err = dispatcher.register("TestAdmin", "echo", echo_remote(), RemoteConstraints::default());
        assert!(matches!(err, Err(DispatchError::AlreadyRegistered { .. })));
    }

    #[test]
    fn extends_copies_entries_into_parent() {
        let child = Dispatcher::new();
        child
            .register("Child", "m", echo_remote(), RemoteConstraints::default())
            .unwrap();
        let parent = Dispatcher::new();
        child.extend_into(&parent).unwrap();
        assert!(parent.constraints("Child", "m").is_some());
    }

    #[test]
    fn collector_drains_into_dispatcher() {
        let mut collector = RemoteCollector::new();
        collector.register("TestAdmin", "echo", echo_remote());
        let dispatcher = Dispatcher::new();
        collector.drain_into(&dispatcher).unwrap();
        assert!(dispatcher.constraints("TestAdmin", "echo").is_some());
    }
}
