//! Write-Ahead Log (WAL) for finished sessions and meal logs.
//!
//! Records are appended to a JSONL (JSON Lines) file under an exclusive
//! file lock, so several processes may log at once.

use crate::{MealLog, Result, SessionRecord};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Persistence collaborator for finished workout sessions
pub trait SessionSink {
    fn append(&mut self, record: &SessionRecord) -> Result<()>;
}

/// Persistence collaborator for meal logs
pub trait MealLogSink {
    fn append_meal(&mut self, log: &MealLog) -> Result<()>;
}

/// JSONL-based sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one record as a JSON line
    pub fn append_line<T: Serialize>(&mut self, record: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, record: &SessionRecord) -> Result<()> {
        self.append_line(record)?;
        tracing::debug!("Appended session {} to WAL", record.id);
        Ok(())
    }
}

impl MealLogSink for JsonlSink {
    fn append_meal(&mut self, log: &MealLog) -> Result<()> {
        log.validate()?;
        self.append_line(log)?;
        tracing::debug!("Appended meal '{}' for {} to WAL", log.meal_name, log.student_id);
        Ok(())
    }
}

/// Read every parseable record from a WAL file
///
/// Corrupt lines are logged and skipped.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse record at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Read all finished sessions from a WAL file
pub fn read_sessions(path: &Path) -> Result<Vec<SessionRecord>> {
    read_records(path)
}

/// Read all meal logs from a WAL file
pub fn read_meal_logs(path: &Path) -> Result<Vec<MealLog>> {
    read_records(path)
}
