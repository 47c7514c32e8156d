//! Append-only log of emotion changes during a session.
//!
//! Entries carry only a timestamp and an emotion label. Frames, crops and
//! score vectors never reach this module.

use crate::{emotion::Emotion, Error, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One recorded emotion change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    /// Serialized as RFC 3339
    pub timestamp: DateTime<Utc>,
    pub emotion: Emotion,
}

/// Records a new entry whenever the observed emotion changes
#[derive(Default)]
pub struct SessionLogger {
    entries: Vec<SessionLogEntry>,
    last_emotion: Option<Emotion>,
    sink: Option<LogSink>,
}

struct LogSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SessionLogger {
    /// In-memory logger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger that also appends every entry as a JSON line to `path`
    pub fn with_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::SessionLogError(format!("Cannot open {}: {e}", path.display())))?;
        debug!("Session log mirrored to {}", path.display());
        Ok(Self {
            sink: Some(LogSink {
                path,
                writer: BufWriter::new(file),
            }),
            ..Self::default()
        })
    }

    /// Observe the current emotion. Appends an entry and returns `true` only
    /// when it differs from the previously observed one.
    pub fn record(&mut self, emotion: Emotion, timestamp: DateTime<Utc>) -> bool {
        if self.last_emotion == Some(emotion) {
            return false;
        }
        self.last_emotion = Some(emotion);

        let entry = SessionLogEntry { timestamp, emotion };
        self.entries.push(entry);
        debug!("Emotion changed to {emotion} at {}", timestamp.to_rfc3339());

        if let Some(sink) = &mut self.sink {
            if let Err(e) = sink.append(&entry) {
                warn!("Failed to write session log {}: {e}", sink.path.display());
            }
        }
        true
    }

    #[must_use]
    pub fn entries(&self) -> &[SessionLogEntry] {
        &self.entries
    }

    /// The last `n` entries, oldest first
    #[must_use]
    pub fn recent(&self, n: usize) -> &[SessionLogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    #[must_use]
    pub fn last_emotion(&self) -> Option<Emotion> {
        self.last_emotion
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget all entries. The next observed emotion is logged again.
    /// The file sink, if any, is left untouched.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_emotion = None;
    }

    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|s| s.path.as_path())
    }
}

impl LogSink {
    fn append(&mut self, entry: &SessionLogEntry) -> Result<()> {
        serde_json::to_writer(&mut self.writer, entry)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Read back a JSON-lines session log. Blank lines are skipped.
pub fn read_log_file<P: AsRef<Path>>(path: P) -> Result<Vec<SessionLogEntry>> {
    let file = File::open(path)?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(&line)?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_records_only_changes() {
        let mut logger = SessionLogger::new();
        let t0 = Utc::now();
        assert!(logger.record(Emotion::Happy, t0));
        assert!(!logger.record(Emotion::Happy, t0 + Duration::seconds(1)));
        assert!(logger.record(Emotion::Sad, t0 + Duration::seconds(2)));
        assert_eq!(logger.len(), 2);
        assert_eq!(logger.last_emotion(), Some(Emotion::Sad));
    }

    #[test]
    fn test_recent_tail() {
        let mut logger = SessionLogger::new();
        let t0 = Utc::now();
        for (i, emotion) in Emotion::ALL.iter().enumerate() {
            logger.record(*emotion, t0 + Duration::seconds(i as i64));
        }
        let tail = logger.recent(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[2].emotion, Emotion::Neutral);
        assert_eq!(logger.recent(100).len(), Emotion::ALL.len());
    }

    #[test]
    fn test_clear_relogs_same_emotion() {
        let mut logger = SessionLogger::new();
        logger.record(Emotion::Fear, Utc::now());
        logger.clear();
        assert!(logger.is_empty());
        assert!(logger.record(Emotion::Fear, Utc::now()));
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = SessionLogEntry {
            timestamp: "2024-05-01T12:00:00Z".parse().unwrap(),
            emotion: Emotion::Disgust,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"timestamp":"2024-05-01T12:00:00Z","emotion":"disgust"}"#);
    }
}
