//! In-process reference transport (`memory://`), for tests and
//! single-process demos. Implements the exact contract of
//! [`super::traits`] without a real broker, connection, or channel —
//! wiring an actual AMQP client is out of scope (§1).

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

// Layer 3: Internal module imports
use super::error::TransportError;
use super::model::{Destination, QueueSpec};
use super::registry::TransportFactory;
use super::traits::{Broker, EndpointState, Producer, Queue, Reader, SslConfig};
use crate::envelope::Envelope;
use crate::util::Sn;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Shared mailbox state for every queue bound through one factory.
#[derive(Default)]
struct MemoryHub {
    queues: DashMap<String, Arc<Mutex<VecDeque<Envelope>>>>,
}

impl MemoryHub {
    fn queue_for(&self, destination: &Destination) -> Arc<Mutex<VecDeque<Envelope>>> {
        self.queues
            .entry(destination.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone()
    }

    fn drop_queue(&self, destination: &Destination) {
        self.queues.remove(&destination.to_string());
    }
}

/// Creates [`InMemoryBroker`]s, [`InMemoryQueue`]s, producers, and
/// readers that all share one [`MemoryHub`].
pub struct InMemoryTransportFactory {
    hub: Arc<MemoryHub>,
}

impl InMemoryTransportFactory {
    pub fn new() -> Self {
        Self {
            hub: Arc::new(MemoryHub::default()),
        }
    }

    pub fn broker(&self) -> InMemoryBroker {
        InMemoryBroker {
            ssl: SslConfig::default(),
            state: EndpointState::new(),
        }
    }

    pub fn queue(&self, spec: QueueSpec) -> InMemoryQueue {
        InMemoryQueue {
            spec,
            hub: Arc::clone(&self.hub),
        }
    }

    pub fn producer(&self) -> InMemoryProducer {
        InMemoryProducer {
            hub: Arc::clone(&self.hub),
            state: EndpointState::new(),
        }
    }

    pub fn reader(&self, destination: Destination) -> InMemoryReader {
        InMemoryReader {
            hub: Arc::clone(&self.hub),
            destination,
            state: EndpointState::new(),
        }
    }
}

impl Default for InMemoryTransportFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportFactory for InMemoryTransportFactory {
    fn scheme(&self) -> &str {
        "memory"
    }

    fn broker(&self) -> Box<dyn Broker> {
        Box::new(InMemoryTransportFactory::broker(self))
    }

    fn queue(&self, spec: QueueSpec) -> Arc<dyn Queue> {
        Arc::new(InMemoryTransportFactory::queue(self, spec))
    }

    fn producer(&self) -> Arc<dyn Producer> {
        Arc::new(InMemoryTransportFactory::producer(self))
    }

    fn reader(&self, destination: Destination) -> Arc<dyn Reader> {
        Arc::new(InMemoryTransportFactory::reader(self, destination))
    }
}

/// The in-process stand-in for an AMQP broker connection.
pub struct InMemoryBroker {
    ssl: SslConfig,
    state: EndpointState,
}

#[async_trait]
impl Broker for InMemoryBroker {
    fn set_ssl(&mut self, ssl: SslConfig) {
        self.ssl = ssl;
    }

    async fn connect(&self) -> Result<(), TransportError> {
        self.state.mark_open();
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.state.mark_closed();
        Ok(())
    }
}

pub struct InMemoryQueue {
    spec: QueueSpec,
    hub: Arc<MemoryHub>,
}

#[async_trait]
impl Queue for InMemoryQueue {
    async fn declare(&self) -> Result<(), TransportError> {
        self.hub.queue_for(&self.spec.destination);
        Ok(())
    }

    async fn delete(&self, drain: bool) -> Result<(), TransportError> {
        if drain {
            let queue = self.hub.queue_for(&self.spec.destination);
            queue.lock().clear();
        }
        self.hub.drop_queue(&self.spec.destination);
        Ok(())
    }

    fn destination(&self) -> Destination {
        self.spec.destination.clone()
    }

    fn spec(&self) -> &QueueSpec {
        &self.spec
    }
}

pub struct InMemoryProducer {
    hub: Arc<MemoryHub>,
    state: EndpointState,
}

impl InMemoryProducer {
    pub fn open(&self) {
        self.state.mark_open();
    }
}

#[async_trait]
impl Producer for InMemoryProducer {
    async fn send(&self, destination: &Destination, envelope: Envelope) -> Result<Sn, TransportError> {
        self.open();
        let sn = envelope.sn;
        let queue = self.hub.queue_for(destination);
        queue.lock().push_back(envelope);
        Ok(sn)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.state.mark_closed();
        Ok(())
    }
}

pub struct InMemoryReader {
    hub: Arc<MemoryHub>,
    destination: Destination,
    state: EndpointState,
}

impl InMemoryReader {
    pub fn open(&self) {
        self.state.mark_open();
    }
}

#[async_trait]
impl Reader for InMemoryReader {
    async fn fetch(&self, timeout: Duration) -> Result<Option<Envelope>, TransportError> {
        self.open();
        let deadline = Instant::now() + timeout;
        loop {
            {
                let queue = self.hub.queue_for(&self.destination);
                let mut guard = queue.lock();
                if let Some(envelope) = guard.pop_front() {
                    return Ok(Some(envelope));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(timeout)).await;
        }
    }

    async fn search(&self, sn: Sn, timeout: Duration) -> Result<Option<Envelope>, TransportError> {
        self.open();
        let deadline = Instant::now() + timeout;
        loop {
            {
                let queue = self.hub.queue_for(&self.destination);
                let mut guard = queue.lock();
                if let Some(pos) = guard.iter().position(|env| env.sn == sn) {
                    return Ok(guard.remove(pos));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(timeout)).await;
        }
    }

    async fn ack(&self) -> Result<(), TransportError> {
        // The in-memory hub removes an envelope from its queue the
        // moment it is fetched/searched, so there is nothing left to
        // acknowledge: a real broker adapter would ack the underlying
        // delivery tag here.
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.state.mark_closed();
        Ok(())
    }
}
