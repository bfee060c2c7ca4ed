//! JSONL event reader

use crate::error::EventError;
use crate::event::EventRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Sequential reader over the files of an event store
pub struct EventReader {
    files: Vec<PathBuf>,
}

impl EventReader {
    /// Create a reader from a directory; a missing directory reads as empty
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let mut files = Vec::new();

        if path.exists() {
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if file_path.extension().is_some_and(|ext| ext == "jsonl") {
                    files.push(file_path);
                }
            }
        }

        files.sort();

        Ok(Self { files })
    }

    fn read_file(path: &Path) -> Result<Vec<EventRecord>, EventError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|_| EventError::InvalidFile {
                path: path.display().to_string(),
                line: index + 1,
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Read all records from all files in order
    pub fn read_all(&self) -> Result<Vec<EventRecord>, EventError> {
        let mut records = Vec::new();
        for file_path in &self.files {
            records.extend(Self::read_file(file_path)?);
        }
        Ok(records)
    }

    /// Height of the last stored record
    pub fn last_height(&self) -> Result<Option<u64>, EventError> {
        match self.files.last() {
            Some(last_file) => Ok(Self::read_file(last_file)?.last().map(|r| r.height)),
            None => Ok(None),
        }
    }

    /// Count records across all files
    pub fn count(&self) -> Result<usize, EventError> {
        let mut count = 0;
        for file_path in &self.files {
            let reader = BufReader::new(File::open(file_path)?);
            for line in reader.lines() {
                if !line?.trim().is_empty() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, ModuleEvent};
    use crate::store::EventStore;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(height: u64, day: u32) -> EventRecord {
        EventRecord::new(
            height,
            Utc.with_ymd_and_hms(2021, 6, day, 12, 0, 0).unwrap(),
            ModuleEvent::new(EventKind::HardDeposit).with("amount", height),
        )
    }

    #[test]
    fn test_roundtrip_across_dates() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::new(dir.path()).unwrap();
        store
            .append_all(&[record(1, 1), record(2, 1), record(3, 2)])
            .unwrap();
        store.close().unwrap();

        assert_eq!(store.list_files().unwrap().len(), 2);

        let reader = EventReader::from_directory(dir.path()).unwrap();
        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].event.attribute("amount"), Some("3"));
        assert_eq!(reader.count().unwrap(), 3);
        assert_eq!(reader.last_height().unwrap(), Some(3));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let reader = EventReader::from_directory(dir.path().join("absent")).unwrap();
        assert_eq!(reader.count().unwrap(), 0);
        assert_eq!(reader.last_height().unwrap(), None);
    }

    #[test]
    fn test_corrupt_line_reports_position() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("2021-06-01.jsonl"), "\nnot json\n").unwrap();
        let reader = EventReader::from_directory(dir.path()).unwrap();
        assert!(matches!(
            reader.read_all(),
            Err(EventError::InvalidFile { line: 2, .. })
        ));
    }
}
