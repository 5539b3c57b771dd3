//! Periodic in-process jobs attached to a plugin (§4.9, component C9).

pub mod error;

pub use error::ActionError;

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex as SyncMutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

const TICK: StdDuration = StdDuration::from_secs(1);

/// A parameterless callable decorated with a period (§4.9 "seconds,
/// minutes, hours, days").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Seconds(u32),
    Minutes(u32),
    Hours(u32),
    Days(u32),
}

impl Period {
    pub fn as_duration(&self) -> StdDuration {
        let secs = match *self {
            Period::Seconds(n) => n as u64,
            Period::Minutes(n) => n as u64 * 60,
            Period::Hours(n) => n as u64 * 3600,
            Period::Days(n) => n as u64 * 86400,
        };
        StdDuration::from_secs(secs)
    }
}

/// One unit of periodic work; a plugin registers as many as it needs.
#[async_trait]
pub trait ActionTask: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self) -> Result<(), ActionError>;
}

struct Scheduled {
    task: Arc<dyn ActionTask>,
    period: StdDuration,
    next_run: DateTime<Utc>,
}

/// Drives every registered [`ActionTask`] on one shared tick (§4.9: "a
/// single agent-wide scheduler wakes every second").
pub struct ActionScheduler {
    actions: Arc<SyncMutex<Vec<Scheduled>>>,
    stopping: Arc<AtomicBool>,
    handle: SyncMutex<Option<JoinHandle<()>>>,
}

impl ActionScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            actions: Arc::new(SyncMutex::new(Vec::new())),
            stopping: Arc::new(AtomicBool::new(false)),
            handle: SyncMutex::new(None),
        })
    }

    /// Register `task` to run every `period`, starting one period from now.
    pub fn register(&self, task: Arc<dyn ActionTask>, period: Period) {
        let duration = period.as_duration();
        let next_run = Utc::now() + chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        self.actions.lock().push(Scheduled { task, period: duration, next_run });
    }

    /// Start the 1s tick loop on its own task. Idempotent.
    pub fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return;
        }
        let scheduler = Arc::clone(self);
        *handle = Some(tokio::spawn(async move { scheduler.run().await }));
    }

    async fn run(self: Arc<Self>) {
        while !self.stopping.load(Ordering::Relaxed) {
            let now = Utc::now();
            let due: Vec<Arc<dyn ActionTask>> = {
                let mut actions = self.actions.lock();
                let mut due = Vec::new();
                for scheduled in actions.iter_mut() {
                    if scheduled.next_run <= now {
                        due.push(Arc::clone(&scheduled.task));
                        scheduled.next_run = now
                            + chrono::Duration::from_std(scheduled.period).unwrap_or(chrono::Duration::zero());
                    }
                }
                due
            };
            for task in due {
                if let Err(err) = task.run().await {
                    error!(action = task.name(), error = %err, "action failed; still scheduled");
                } else {
                    info!(action = task.name(), "action ran");
                }
            }
            tokio::time::sleep(TICK).await;
        }
    }

    pub async fn stop(&self) {
        self.stopping.store(true, Ordering::Relaxed);
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct CountingTask {
        count: Arc<AtomicU32>,
    }

    #[async_trait]
    impl ActionTask for CountingTask {
        fn name(&self) -> &str {
            "counting"
        }

        async fn run(&self) -> Result<(), ActionError> {
            self.count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    struct FailingTask;

    #[async_trait]
    impl ActionTask for FailingTask {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self) -> Result<(), ActionError> {
            Err(ActionError::new("failing", std::io::Error::other("boom")))
        }
    }

    #[tokio::test]
    async fn runs_due_action_and_reschedules() {
        let scheduler = ActionScheduler::new();
        let count = Arc::new(AtomicU32::new(0));
        scheduler.register(Arc::new(CountingTask { count: Arc::clone(&count) }), Period::Seconds(0));
        scheduler.start();
        tokio::time::sleep(StdDuration::from_millis(1200)).await;
        scheduler.stop().await;
        assert!(count.load(Ordering::Relaxed) >= 1);
    }

    #[tokio::test]
    async fn failing_action_stays_scheduled() {
        let scheduler = ActionScheduler::new();
        scheduler.register(Arc::new(FailingTask), Period::Seconds(0));
        scheduler.start();
        tokio::time::sleep(StdDuration::from_millis(1200)).await;
        scheduler.stop().await;
        // No panic, no removal: still present in the action list.
        assert_eq!(scheduler.actions.lock().len(), 1);
    }
}
