//! Append-only evidence journal.
//!
//! Events are stored as newline-delimited JSON (JSONL). Current state is
//! never written directly: it is rebuilt by replaying the journal into an
//! [`InMemoryRepository`].

use std::fs::{File as StdFile, OpenOptions as StdOpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use fs2::FileExt;
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, instrument};

use super::repository::InMemoryRepository;
use crate::domain::EvidenceEvent;
use crate::error::EvidenceError;

/// Errors that can occur reading or writing the journal
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt journal entry at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("Journal does not replay cleanly: {0}")]
    Replay(#[from] EvidenceError),
}

/// Durable sink for evidence events
#[async_trait]
pub trait Journal: Send + Sync {
    /// Append one event at the end of the log
    async fn append(&self, event: &EvidenceEvent) -> Result<(), JournalError>;

    /// All events in append order
    async fn replay(&self) -> Result<Vec<EvidenceEvent>, JournalError>;

    /// Append several events in order
    async fn append_all(&self, events: &[EvidenceEvent]) -> Result<(), JournalError> {
        for event in events {
            self.append(event).await?;
        }
        Ok(())
    }

    /// Rebuild repository state from the recorded events
    async fn load_repository(&self) -> Result<InMemoryRepository, JournalError> {
        let events = self.replay().await?;
        Ok(InMemoryRepository::from_events(&events)?)
    }
}

/// File-based journal using JSONL format
#[derive(Debug, Clone)]
pub struct JsonlJournal {
    /// Path to the journal file
    path: PathBuf,

    /// Sibling file holding the writer lock
    lock_path: PathBuf,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    /// Open a journal, creating its parent directory
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let journal = Self::new(path);
        if let Some(parent) = journal.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(journal)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the exclusive writer lock.
    ///
    /// Hold it across replay, precondition checks and append so two writers
    /// cannot both decide the same pending version.
    pub fn lock(&self) -> Result<JournalLock, JournalError> {
        let file = StdOpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;

        file.lock_exclusive()?;
        debug!(path = %self.lock_path.display(), "Journal lock acquired");

        Ok(JournalLock { file })
    }
}

#[async_trait]
impl Journal for JsonlJournal {
    #[instrument(skip(self, event), fields(event_type = ?event.event_type))]
    async fn append(&self, event: &EvidenceEvent) -> Result<(), JournalError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let json = serde_json::to_string(event)?;
        file.write_all(format!("{}\n", json).as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn replay(&self) -> Result<Vec<EvidenceEvent>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut events = Vec::new();
        let mut line_number = 0;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let event: EvidenceEvent =
                serde_json::from_str(&line).map_err(|e| JournalError::Corrupt {
                    line: line_number,
                    reason: e.to_string(),
                })?;
            events.push(event);
        }

        debug!(count = events.len(), "Journal replayed");
        Ok(events)
    }
}

/// Exclusive writer lock; released on drop
#[derive(Debug)]
pub struct JournalLock {
    file: StdFile,
}

impl Drop for JournalLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// In-process journal, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryJournal {
    events: Mutex<Vec<EvidenceEvent>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EvidenceEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Journal for MemoryJournal {
    async fn append(&self, event: &EvidenceEvent) -> Result<(), JournalError> {
        self.lock().push(event.clone());
        Ok(())
    }

    async fn replay(&self) -> Result<Vec<EvidenceEvent>, JournalError> {
        Ok(self.lock().clone())
    }
}
