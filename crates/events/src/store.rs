//! JSONL event store - append-only writer

use crate::error::EventError;
use crate::event::EventRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Append-only JSONL event store, one file per block date
pub struct EventStore {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
}

impl EventStore {
    /// Create a new event store at the given path
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Append a record, rotating to the file of the record's block date
    pub fn append(&mut self, record: &EventRecord) -> Result<(), EventError> {
        let date = record.time.format("%Y-%m-%d").to_string();

        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        Ok(())
    }

    /// Append every record in order
    pub fn append_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a EventRecord>,
    ) -> Result<usize, EventError> {
        let mut written = 0;
        for record in records {
            self.append(record)?;
            written += 1;
        }
        debug!(written, "Event records appended");
        Ok(written)
    }

    fn rotate_file(&mut self, date: &str) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    /// List all JSONL files in the store, oldest date first
    pub fn list_files(&self) -> Result<Vec<PathBuf>, EventError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl Drop for EventStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
