//! `Plugin` (§3, §4.8): a unit of remote code loaded into an agent —
//! owns its dispatcher, thread pool, consumer, whiteboard, and actions.

// Layer 1: Standard library imports
use std::path::PathBuf;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

// Layer 3: Internal module imports
use crate::action::{ActionTask, Period};
use crate::auth::Authenticator;
use crate::consumer::RequestConsumer;
use crate::dispatcher::{Dispatcher, Return};
use crate::pending::PendingStore;
use crate::pool::ThreadPool;
use crate::transport::{Destination, QueueSpec, TransportFactory};

use super::descriptor::PluginDescriptor;
use super::error::PluginError;
use super::whiteboard::Whiteboard;

/// A loaded plugin. Lifecycle: created from descriptor → code loaded
/// (via [`super::loader::PluginLoader`]) → dispatcher populated →
/// attached to broker → serving → detached → destroyed.
pub struct Plugin {
    name: String,
    descriptor: PluginDescriptor,
    dispatcher: Arc<Dispatcher>,
    pool: Arc<ThreadPool<Return>>,
    whiteboard: Whiteboard,
    actions: SyncMutex<Vec<(Arc<dyn ActionTask>, Period)>>,
    authenticator: SyncMutex<Option<Arc<dyn Authenticator>>>,
    consumer: AsyncMutex<Option<Arc<RequestConsumer>>>,
}

impl Plugin {
    pub fn new(name: impl Into<String>, descriptor: PluginDescriptor) -> Self {
        let threads = descriptor.threads();
        Self {
            name: name.into(),
            descriptor,
            dispatcher: Arc::new(Dispatcher::new()),
            pool: Arc::new(ThreadPool::new(threads)),
            whiteboard: Whiteboard::new(),
            actions: SyncMutex::new(Vec::new()),
            authenticator: SyncMutex::new(None),
            consumer: AsyncMutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn whiteboard(&self) -> &Whiteboard {
        &self.whiteboard
    }

    pub fn uuid(&self) -> Option<&str> {
        self.descriptor.uuid()
    }

    pub fn url(&self) -> Option<&str> {
        self.descriptor.url()
    }

    pub fn enabled(&self) -> bool {
        self.descriptor.enabled()
    }

    pub fn set_authenticator(&self, authenticator: Option<Arc<dyn Authenticator>>) {
        *self.authenticator.lock() = authenticator;
    }

    pub fn register_action(&self, task: Arc<dyn ActionTask>, period: Period) {
        self.actions.lock().push((task, period));
    }

    pub fn actions(&self) -> Vec<(Arc<dyn ActionTask>, Period)> {
        self.actions.lock().clone()
    }

    /// Merge this plugin's dispatcher entries into `parent`'s (§4.8
    /// `extend()`, §9 "child remotes become entries under the parent's
    /// namespace").
    pub fn extend_into(&self, parent: &Plugin) -> Result<(), PluginError> {
        self.dispatcher.extend_into(&parent.dispatcher)?;
        Ok(())
    }

    /// Declare the agent queue, open a [`RequestConsumer`] over it, and
    /// start the receive loop (§4.8 `Plugin.attach`).
    pub async fn attach(
        &self,
        factory: &dyn TransportFactory,
        pending_path: PathBuf,
    ) -> Result<(), PluginError> {
        let uuid = self.descriptor.uuid().unwrap_or(&self.name).to_string();
        let url = self.descriptor.url().unwrap_or_default().to_string();
        let destination = Destination::direct(uuid.clone());

        let queue = factory.queue(QueueSpec::new(uuid.clone(), destination.clone()));
        queue.declare().await?;

        let reader = factory.reader(destination.clone());
        let producer = factory.producer();
        let pending = Arc::new(PendingStore::open(pending_path).await?);
        let authenticator = self.authenticator.lock().clone();

        let consumer = RequestConsumer::new(
            uuid.clone(),
            reader,
            producer,
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.pool),
            pending,
            authenticator,
        );
        consumer.start().await?;
        *self.consumer.lock().await = Some(consumer);
        info!(plugin = %self.name, uuid = %uuid, url = %url, "plugin attached");
        Ok(())
    }

    /// Stop and drop the consumer, draining and deleting the queue if
    /// it is agent-managed (§4.8 `Plugin.detach`). Safe to call
    /// repeatedly and while a call is in flight.
    pub async fn detach(&self, factory: &dyn TransportFactory) -> Result<(), PluginError> {
        let consumer = self.consumer.lock().await.take();
        let Some(consumer) = consumer else {
            return Ok(());
        };
        consumer.stop().await?;
        if self.descriptor.managed() {
            if let Some(uuid) = self.descriptor.uuid() {
                let destination = Destination::direct(uuid);
                let queue = factory.queue(QueueSpec::new(uuid, destination));
                queue.delete(true).await?;
            }
        }
        info!(plugin = %self.name, "plugin detached");
        Ok(())
    }
}
