//! CSV rollup of finished sessions.
//!
//! Session records are flattened to one row per set and appended to a CSV
//! file. The CSV is fsynced before the WAL is renamed, so an interrupted
//! rollup never loses a session.

use crate::{Result, SessionRecord};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    session_id: String,
    student_id: Option<String>,
    started_at: Option<String>,
    finished_at: Option<String>,
    elapsed_seconds: u64,
    exercise_index: usize,
    exercise_id: String,
    set_index: usize,
    target_reps: u32,
    target_weight: Option<f64>,
    actual_reps: Option<u32>,
    actual_weight: Option<f64>,
    completed: bool,
    completed_at: Option<String>,
}

fn rows_for(record: &SessionRecord) -> Vec<CsvRow> {
    record
        .exercises
        .iter()
        .enumerate()
        .flat_map(|(exercise_index, exercise)| {
            exercise.sets.iter().map(move |set| CsvRow {
                session_id: record.id.to_string(),
                student_id: record.student_id.clone(),
                started_at: record.started_at.map(|t| t.to_rfc3339()),
                finished_at: record.finished_at.map(|t| t.to_rfc3339()),
                elapsed_seconds: record.elapsed_seconds,
                exercise_index,
                exercise_id: exercise.exercise_id.clone(),
                set_index: set.set_index,
                target_reps: set.target_reps,
                target_weight: set.target_weight,
                actual_reps: set.actual_reps,
                actual_weight: set.actual_weight,
                completed: set.completed,
                completed_at: set.completed_at.map(|t| t.to_rfc3339()),
            })
        })
        .collect()
}

/// Roll up WAL sessions into CSV and archive the WAL
///
/// Returns the number of sessions processed.
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::wal::read_sessions(wal_path)?;

    if records.is_empty() {
        tracing::info!("No sessions in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only a fresh file gets a header row
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let mut row_count = 0;
    for record in &records {
        for row in rows_for(record) {
            writer.serialize(row)?;
            row_count += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!(
        "Wrote {} sessions ({} set rows) to CSV",
        records.len(),
        row_count
    );

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(records.len())
}

/// Remove all `.wal.processed` files in the given directory
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::{JsonlSink, SessionSink};
    use crate::{ExerciseExecution, SetExecution, SetTarget};
    use chrono::Utc;
    use std::fs::File;
    use uuid::Uuid;

    fn create_test_record(sets_per_exercise: usize) -> SessionRecord {
        let exercise = |id: &str| ExerciseExecution {
            exercise_id: id.into(),
            sets: (0..sets_per_exercise)
                .map(|i| {
                    let mut set = SetExecution::pending(
                        i,
                        SetTarget {
                            target_reps: 10,
                            target_weight: Some(20.0),
                        },
                    );
                    set.completed = true;
                    set.actual_reps = Some(10);
                    set.actual_weight = Some(20.0);
                    set.completed_at = Some(Utc::now());
                    set
                })
                .collect(),
        };

        SessionRecord {
            id: Uuid::new_v4(),
            student_id: None,
            started_at: Some(Utc::now()),
            finished_at: Some(Utc::now()),
            elapsed_seconds: 600,
            active_exercise_index: Some(1),
            exercises: vec![exercise("lunge"), exercise("curl")],
        }
    }

    #[test]
    fn test_wal_to_csv_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("sessions.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        let mut sink = JsonlSink::new(&wal_path);
        for _ in 0..3 {
            sink.append(&create_test_record(2)).unwrap();
        }

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 3);

        assert!(csv_path.exists());
        assert!(!wal_path.exists());
        assert!(wal_path.with_extension("wal.processed").exists());

        // 3 sessions x 2 exercises x 2 sets
        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 12);
    }

    #[test]
    fn test_wal_to_csv_appends_without_repeating_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("sessions.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_record(1)).unwrap();
        assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 1);

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&create_test_record(1)).unwrap();
        assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 1);

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content.matches("session_id").count(), 1);

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 4);
    }

    #[test]
    fn test_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("empty.wal");
        let csv_path = temp_dir.path().join("sessions.csv");

        File::create(&wal_path).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_cleanup_processed_wals() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("s1.wal.processed")).unwrap();
        File::create(temp_dir.path().join("s2.wal.processed")).unwrap();
        File::create(temp_dir.path().join("keep.wal")).unwrap();

        let count = cleanup_processed_wals(temp_dir.path()).unwrap();
        assert_eq!(count, 2);

        assert!(!temp_dir.path().join("s1.wal.processed").exists());
        assert!(temp_dir.path().join("keep.wal").exists());
    }
}
