//! Persisted deployment journal
//!
//! The journal has two halves: the view, which holds every entry appended
//! during this process plus whatever was loaded at startup, and the persisted
//! list, which is trimmed to the retention limit on every write.

use tracing::{debug, warn};

use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::models::log_entry::{LogEntry, LogKind};

pub const DEFAULT_RETENTION: usize = 100;

pub struct Journal {
    file: File,
    retention: usize,
    persisted: Vec<LogEntry>,
    view: Vec<LogEntry>,
}

impl Journal {
    /// Load the journal, rebuilding the view from the persisted entries.
    ///
    /// An unreadable file is logged and treated as empty.
    pub async fn load(file: File, retention: usize) -> Self {
        let persisted = match file.read_json_or_default::<Vec<LogEntry>>().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Unable to read journal {}: {}",
                    file.path().display(),
                    e
                );
                Vec::new()
            }
        };
        debug!("Loaded {} journal entries", persisted.len());

        Self {
            file,
            retention,
            view: persisted.clone(),
            persisted,
        }
    }

    /// Entries in display order
    pub fn entries(&self) -> &[LogEntry] {
        &self.view
    }

    /// Entries currently persisted
    pub fn persisted(&self) -> &[LogEntry] {
        &self.persisted
    }

    /// Append an entry. A failed write is logged; the view keeps the entry.
    pub async fn append(&mut self, message: impl Into<String>, kind: LogKind) -> LogEntry {
        let entry = LogEntry::now(message, kind);
        self.view.push(entry.clone());

        let mut next = self.persisted.clone();
        next.push(entry.clone());
        trim_oldest(&mut next, self.retention);

        match self.file.write_json(&next).await {
            Ok(()) => self.persisted = next,
            Err(e) => warn!("Unable to persist journal entry: {}", e),
        }

        entry
    }

    /// Drop every entry, both displayed and persisted
    pub async fn clear(&mut self) -> Result<(), ConsoleError> {
        self.view.clear();
        self.persisted.clear();
        self.file.delete().await
    }
}

/// Evict the oldest entries until at most `retention` remain
pub fn trim_oldest(entries: &mut Vec<LogEntry>, retention: usize) {
    if entries.len() > retention {
        let excess = entries.len() - retention;
        entries.drain(..excess);
    }
}
