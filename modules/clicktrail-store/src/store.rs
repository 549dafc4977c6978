use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use clicktrail_common::EventRecord;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::line::render_line;

/// Acknowledgement for one appended event.
#[derive(Debug, Clone)]
pub struct Appended {
    pub line: String,
    pub received_at: DateTime<Utc>,
}

/// Append-only event log backed by a single text file.
///
/// Holds no file handle: every append opens, writes the whole line in one
/// call, and closes. `O_APPEND` keeps lines whole. Clones share one append
/// lock, held from taking the receipt time until the line is written, so
/// `TIME:` never decreases in file order.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
    append_lock: Arc<Mutex<()>>,
}

impl EventLog {
    /// Point the log at `path`, creating the parent directory if needed.
    /// The file itself is created by the first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Append {
                path: path.clone(),
                source,
            })?;
        }
        Ok(Self {
            path,
            append_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event. Returns once the line is written.
    pub async fn append(&self, record: &EventRecord, sender: &str) -> Result<Appended> {
        let path = self.path.clone();
        let lock = Arc::clone(&self.append_lock);
        let owned = record.clone();
        let sender = sender.to_string();

        let appended = tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let received_at = Utc::now();
            let line = render_line(&owned, &sender, received_at);
            append_bytes(&path, line.as_bytes()).map(|()| Appended { line, received_at })
        })
        .await
        .map_err(|join| StoreError::Append {
            path: self.path.clone(),
            source: io::Error::other(join),
        })?
        .map_err(|source| StoreError::Append {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), event_type = %record.event_type, "Appended event");
        Ok(appended)
    }

    /// Full log content, verbatim.
    pub async fn read_all(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })
    }
}

fn append_bytes(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(data: &str) -> EventRecord {
        EventRecord {
            event_type: "Window Action".to_string(),
            data: data.to_string(),
            device_info: "800, 600, UnitTest, en".to_string(),
        }
    }

    #[tokio::test]
    async fn open_creates_parent_directory_but_not_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/events.log");

        let log = EventLog::open(&path).unwrap();

        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
        assert_eq!(log.path(), path.as_path());
    }

    #[tokio::test]
    async fn read_before_first_append_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path().join("events.log")).unwrap();

        let err = log.read_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[tokio::test]
    async fn append_returns_the_written_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path().join("events.log")).unwrap();

        let ack = log
            .append(&record("Window Focused -- Was Deactive: 2 s"), "10.0.0.7")
            .await
            .unwrap();

        assert!(ack.line.ends_with('\n'));
        assert!(ack.line.contains("IP: 10.0.0.7"));
        assert_eq!(log.read_all().await.unwrap(), ack.line);
    }

    #[tokio::test]
    async fn append_to_a_directory_is_an_append_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path()).unwrap();

        let err = log.append(&record("x"), "127.0.0.1").await.unwrap_err();
        assert!(matches!(err, StoreError::Append { .. }));
    }
}
