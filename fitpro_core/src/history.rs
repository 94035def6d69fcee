//! Recent workout history from the session WAL.

use crate::{Result, SessionRecord};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::path::Path;

/// Aggregate figures over a set of sessions
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub sets_completed: usize,
    pub total_volume: f64,
    pub total_seconds: u64,
}

fn record_time(record: &SessionRecord) -> Option<DateTime<Utc>> {
    record.finished_at.or(record.started_at)
}

/// Load sessions finished within the last `days` days
///
/// Returns records newest first, with duplicate ids dropped.
pub fn load_recent_sessions(wal_path: &Path, days: i64) -> Result<Vec<SessionRecord>> {
    let cutoff = Utc::now() - Duration::days(days);
    let mut seen_ids = HashSet::new();

    let mut records: Vec<SessionRecord> = crate::wal::read_sessions(wal_path)?
        .into_iter()
        .filter(|r| record_time(r).is_some_and(|t| t >= cutoff))
        .filter(|r| seen_ids.insert(r.id))
        .collect();

    records.sort_by(|a, b| record_time(b).cmp(&record_time(a)));

    tracing::info!(
        "Loaded {} sessions from last {} days",
        records.len(),
        days
    );

    Ok(records)
}

/// Totals across the given records
pub fn summarize(records: &[SessionRecord]) -> HistorySummary {
    records.iter().fold(HistorySummary::default(), |mut acc, r| {
        acc.sessions += 1;
        acc.sets_completed += r.completed_sets();
        acc.total_volume += r.total_volume();
        acc.total_seconds += r.elapsed_seconds;
        acc
    })
}
