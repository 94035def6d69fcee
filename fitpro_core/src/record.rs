//! Persistence shape of a finished workout session.

use crate::{Error, ExerciseExecution, Result, SessionStatus, WorkoutSession};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A finished session as handed to the persistence collaborator
///
/// Carries every field of `WorkoutSession` except the transient `status`
/// and rest countdown, both of which are fixed once a session completes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub active_exercise_index: Option<usize>,
    pub exercises: Vec<ExerciseExecution>,
}

impl SessionRecord {
    /// Build a record from a session returned by `finish_session`
    ///
    /// # Errors
    ///
    /// `InvalidState` if the session has not been completed.
    pub fn from_finished(session: &WorkoutSession) -> Result<Self> {
        if session.status != SessionStatus::Completed {
            return Err(Error::InvalidState(format!(
                "only completed sessions can be recorded, session {} is {:?}",
                session.id, session.status
            )));
        }

        Ok(Self {
            id: session.id,
            student_id: None,
            started_at: session.started_at,
            finished_at: session.finished_at,
            elapsed_seconds: session.elapsed_seconds,
            active_exercise_index: session.active_exercise_index,
            exercises: session.exercises.clone(),
        })
    }

    pub fn with_student(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    /// Rebuild the completed session this record was made from
    pub fn into_session(self) -> WorkoutSession {
        WorkoutSession {
            id: self.id,
            status: SessionStatus::Completed,
            started_at: self.started_at,
            finished_at: self.finished_at,
            elapsed_seconds: self.elapsed_seconds,
            exercises: self.exercises,
            active_exercise_index: self.active_exercise_index,
            rest_remaining_seconds: None,
        }
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter(|s| s.completed)
            .count()
    }

    pub fn total_volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .map(|s| s.volume())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::{ActualSet, ExercisePlan, SetTarget, WorkoutSessionStore};
    use chrono::{Duration, TimeZone};

    fn finished_session() -> WorkoutSession {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 2, 18, 30, 0).unwrap());
        let mut store = WorkoutSessionStore::new(&clock);
        store
            .start_session(vec![
                ExercisePlan {
                    exercise_id: "back_squat".into(),
                    sets: vec![
                        SetTarget {
                            target_reps: 5,
                            target_weight: Some(100.0),
                        };
                        3
                    ],
                },
                ExercisePlan {
                    exercise_id: "plank".into(),
                    sets: vec![SetTarget {
                        target_reps: 1,
                        target_weight: None,
                    }],
                },
            ])
            .unwrap();

        let token = store.timer_token();
        clock.advance(Duration::seconds(40));
        store
            .complete_set(
                0,
                0,
                ActualSet {
                    reps: 5,
                    weight: Some(100.0),
                },
            )
            .unwrap();
        store
            .complete_set(
                0,
                1,
                ActualSet {
                    reps: 4,
                    weight: Some(102.5),
                },
            )
            .unwrap();
        for _ in 0..90 {
            store.tick(token);
        }
        store.advance_exercise().unwrap();
        clock.advance(Duration::minutes(10));
        store.finish_session().unwrap()
    }

    #[test]
    fn test_record_roundtrip_through_json() {
        let session = finished_session();
        let record = SessionRecord::from_finished(&session).unwrap();

        let json = serde_json::to_string(&record).unwrap();
        let parsed: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);

        let restored = parsed.into_session();
        assert_eq!(restored, session);
    }

    #[test]
    fn test_record_omits_status() {
        let record = SessionRecord::from_finished(&finished_session()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("status").is_none());
        assert!(value.get("student_id").is_none());

        let value = serde_json::to_value(record.with_student("stu_42")).unwrap();
        assert_eq!(value["student_id"], "stu_42");
    }

    #[test]
    fn test_unfinished_session_is_rejected() {
        let mut store = WorkoutSessionStore::default();
        store
            .start_session(vec![ExercisePlan {
                exercise_id: "row".into(),
                sets: vec![],
            }])
            .unwrap();
        assert!(matches!(
            SessionRecord::from_finished(store.session()),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_record_totals() {
        let record = SessionRecord::from_finished(&finished_session()).unwrap();
        assert_eq!(record.completed_sets(), 2);
        assert!((record.total_volume() - (500.0 + 410.0)).abs() < 1e-9);
        assert_eq!(record.elapsed_seconds, 90);
    }
}
