//! Fixed-size worker pool (§4.5, component C4).
//!
//! FIFO dispatch over `messaging.threads` workers. A submitted [`Job`]
//! carries its own optional `on_done` continuation, which is how the
//! asynchronous dispatch path sends its reply: from inside the worker,
//! after the callable returns, never from the consumer thread.

pub mod error;

pub use error::PoolError;

// Layer 1: Standard library imports
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type OnDone<T> = Box<dyn FnOnce(T) + Send>;

/// One unit of work: a future to run, and an optional continuation to
/// run with its result from inside the worker (§4.5 "on_done").
pub struct Job<T> {
    pub run: BoxFuture<T>,
    pub on_done: Option<OnDone<T>>,
}

impl<T> Job<T> {
    pub fn new(run: BoxFuture<T>) -> Self {
        Self { run, on_done: None }
    }

    pub fn with_on_done(mut self, on_done: impl FnOnce(T) + Send + 'static) -> Self {
        self.on_done = Some(Box::new(on_done));
        self
    }
}

/// A fixed-size worker pool. `size == 1` gives strictly serial
/// execution — see [`ThreadPool::concurrent`].
pub struct ThreadPool<T: Send + 'static> {
    size: usize,
    sender: mpsc::Sender<Job<T>>,
    stopping: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> ThreadPool<T> {
    /// Spawn `size` workers sharing one FIFO queue of bounded depth
    /// `size` — once every worker is busy and the queue is full,
    /// `submit` blocks until a slot frees up (§8 "Pool saturated").
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel(size);
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let stopping = Arc::new(AtomicBool::new(false));
        let workers = (0..size)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    loop {
                        let job = {
                            let mut guard = receiver.lock().await;
                            guard.recv().await
                        };
                        match job {
                            Some(job) => {
                                let result = job.run.await;
                                if let Some(on_done) = job.on_done {
                                    on_done(result);
                                }
                            }
                            None => break,
                        }
                    }
                })
            })
            .collect();
        Self {
            size,
            sender,
            stopping,
            workers,
        }
    }

    /// `true` when more than one worker may run callables at once
    /// (§4.5 "`concurrent()` predicate").
    pub fn concurrent(&self) -> bool {
        self.size > 1
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Enqueue `job`, blocking the caller while the queue is full.
    pub async fn submit(&self, job: Job<T>) -> Result<(), PoolError> {
        if self.stopping.load(Ordering::Relaxed) {
            return Err(PoolError::Stopped);
        }
        self.sender.send(job).await.map_err(|_| PoolError::Stopped)
    }

    /// Stop accepting work, let in-flight jobs drain, and join every
    /// worker within `deadline` (§4.5, §5 "Cancellation / shutdown").
    pub async fn stop(mut self, deadline: Duration) -> Result<(), PoolError> {
        self.stopping.store(true, Ordering::Relaxed);
        drop(self.sender);
        let joins = self.workers.drain(..).map(|handle| async move {
            let _ = handle.await;
        });
        tokio::time::timeout(deadline, futures_join_all(joins))
            .await
            .map_err(|_| PoolError::JoinTimedOut)
    }
}

async fn futures_join_all<I>(iter: I)
where
    I: IntoIterator,
    I::Item: Future<Output = ()>,
{
    for fut in iter {
        fut.await;
    }
}
