//! The durable window scheduler itself (§4.3).
//!
//! Entries are appended one JSON record per line to a single log file;
//! removal is itself an appended tombstone record rather than an
//! in-place rewrite, so every write is append-only and a crash can
//! never corrupt an already-durable entry — only the very last line
//! can be partial, and that line is discarded on recovery.

// Layer 1: Standard library imports
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use parking_lot::Mutex as SyncMutex;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex as AsyncMutex;

// Layer 3: Internal module imports
use super::error::PendingError;
use super::model::{PendingEntry, Record};
use crate::envelope::Envelope;
use crate::util::Sn;

type OrderKey = (DateTime<Utc>, u64, Sn);

struct Index {
    order: BTreeSet<OrderKey>,
    by_sn: HashMap<Sn, PendingEntry>,
}

impl Index {
    fn new() -> Self {
        Self {
            order: BTreeSet::new(),
            by_sn: HashMap::new(),
        }
    }

    fn insert(&mut self, entry: PendingEntry) {
        let begin = entry
            .envelope
            .window
            .map(|w| w.begin)
            .unwrap_or_else(Utc::now);
        self.order.insert((begin, entry.seq, entry.sn()));
        self.by_sn.insert(entry.sn(), entry);
    }

    fn remove(&mut self, sn: Sn) {
        if let Some(entry) = self.by_sn.remove(&sn) {
            let begin = entry
                .envelope
                .window
                .map(|w| w.begin)
                .unwrap_or_else(Utc::now);
            self.order.remove(&(begin, entry.seq, sn));
        }
    }

    fn earliest(&self) -> Option<PendingEntry> {
        self.order
            .iter()
            .next()
            .and_then(|(_, _, sn)| self.by_sn.get(sn).cloned())
    }
}

/// Durable FIFO of envelopes parked until their window opens.
pub struct PendingStore {
    path: PathBuf,
    file: AsyncMutex<tokio::fs::File>,
    index: SyncMutex<Index>,
    seq: AtomicU64,
}

impl PendingStore {
    /// Open (creating if absent) the log at `path`, replaying it to
    /// reconstruct the in-memory index. A trailing partial line — one
    /// not terminated with `\n` — is discarded rather than rejected.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PendingError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| PendingError::Open {
                    path: path.clone(),
                    source,
                })?;
        }
        let raw = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(PendingError::Open {
                    path: path.clone(),
                    source,
                })
            }
        };
        let mut index = Index::new();
        let mut max_seq = 0u64;
        let complete = if raw.last() == Some(&b'\n') {
            &raw[..]
        } else {
            match raw.iter().rposition(|b| *b == b'\n') {
                Some(pos) => &raw[..=pos],
                None => &[],
            }
        };
        for line in complete.split(|b| *b == b'\n') {
            if line.is_empty() {
                continue;
            }
            let record: Record = serde_json::from_slice(line).map_err(|e| PendingError::CorruptRecord {
                detail: e.to_string(),
            })?;
            match record {
                Record::Insert { entry } => {
                    max_seq = max_seq.max(entry.seq);
                    index.insert(entry);
                }
                Record::Remove { sn } => index.remove(sn),
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| PendingError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            file: AsyncMutex::new(file),
            index: SyncMutex::new(index),
            seq: AtomicU64::new(max_seq + 1),
        })
    }

    async fn append(&self, record: &Record) -> Result<(), PendingError> {
        let mut line = serde_json::to_vec(record).map_err(|source| PendingError::Serialize { source })?;
        line.push(b'\n');
        let mut file = self.file.lock().await;
        file.write_all(&line)
            .await
            .map_err(|source| PendingError::Append {
                path: self.path.clone(),
                source,
            })?;
        file.flush().await.map_err(|source| PendingError::Append {
            path: self.path.clone(),
            source,
        })
    }

    /// Durably park `envelope` (§4.3 "Admission").
    pub async fn admit(&self, envelope: Envelope) -> Result<(), PendingError> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let entry = PendingEntry { envelope, seq };
        self.append(&Record::Insert {
            entry: entry.clone(),
        })
        .await?;
        self.index.lock().insert(entry);
        Ok(())
    }

    /// Durably remove `sn` (after a replayed dispatch has been
    /// accepted, per §4.3 "Replay": "removes it from the store only
    /// after dispatch has been accepted").
    pub async fn remove(&self, sn: Sn) -> Result<(), PendingError> {
        self.append(&Record::Remove { sn }).await?;
        self.index.lock().remove(sn);
        Ok(())
    }

    /// The entry with the earliest `window.begin`, if any.
    pub fn earliest(&self) -> Option<PendingEntry> {
        self.index.lock().earliest()
    }

    pub fn len(&self) -> usize {
        self.index.lock().by_sn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Request, Routing, Window};
    use std::time::Duration as StdDuration;
    use tempfile::tempdir;

    fn future_envelope() -> Envelope {
        Envelope::request(Routing::new("client", "agent-1"), Request::new("TestAdmin", "echo"))
            .with_window(Window::new(
                Utc::now() + chrono::Duration::seconds(60),
                StdDuration::from_secs(10),
            ))
    }

    #[tokio::test]
    async fn admit_then_earliest_round_trips() {
        let dir = tempdir().unwrap();
        let store = PendingStore::open(dir.path().join("pending.log")).await.unwrap();
        let env = future_envelope();
        let sn = env.sn;
        store.admit(env).await.unwrap();
        assert_eq!(store.earliest().unwrap().sn(), sn);
    }

    #[tokio::test]
    async fn remove_clears_entry() {
        let dir = tempdir().unwrap();
        let store = PendingStore::open(dir.path().join("pending.log")).await.unwrap();
        let env = future_envelope();
        let sn = env.sn;
        store.admit(env).await.unwrap();
        store.remove(sn).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn survives_restart() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("pending.log");
        let sn = {
            let store = PendingStore::open(&log_path).await.unwrap();
            let env = future_envelope();
            let sn = env.sn;
            store.admit(env).await.unwrap();
            sn
        };
        let reopened = PendingStore::open(&log_path).await.unwrap();
        assert_eq!(reopened.earliest().unwrap().sn(), sn);
    }

    #[tokio::test]
    async fn discards_trailing_partial_line() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("pending.log");
        {
            let store = PendingStore::open(&log_path).await.unwrap();
            store.admit(future_envelope()).await.unwrap();
        }
        // Simulate a crash mid-write: append a truncated, newline-less record.
        {
            use tokio::io::AsyncWriteExt;
            let mut file = OpenOptions::new().append(true).open(&log_path).await.unwrap();
            file.write_all(b"{\"op\":\"insert\",\"entry\":{\"envel").await.unwrap();
        }
        let reopened = PendingStore::open(&log_path).await.unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[tokio::test]
    async fn ties_break_by_insertion_order() {
        let dir = tempdir().unwrap();
        let store = PendingStore::open(dir.path().join("pending.log")).await.unwrap();
        let begin = Utc::now() + chrono::Duration::seconds(30);
        let window = Window::new(begin, StdDuration::from_secs(10));
        let first = Envelope::request(Routing::new("client", "agent-1"), Request::new("TestAdmin", "echo"))
            .with_window(window);
        let second = Envelope::request(Routing::new("client", "agent-1"), Request::new("TestAdmin", "echo"))
            .with_window(window);
        let first_sn = first.sn;
        store.admit(first).await.unwrap();
        store.admit(second).await.unwrap();
        assert_eq!(store.earliest().unwrap().sn(), first_sn);
    }
}
