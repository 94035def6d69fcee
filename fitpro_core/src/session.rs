//! In-memory workout session store.
//!
//! The store owns exactly one `WorkoutSession` and moves it through
//! `idle → active ⇄ resting → completed`. All mutation is synchronous and
//! single-threaded; timer ticks are delivered from outside together with a
//! `TimerToken` so callbacks from a finished or cancelled session are ignored.
//!
//! A failed operation never changes the session.

use crate::clock::{Clock, SystemClock};
use crate::{
    ActualSet, Error, ExerciseExecution, ExercisePlan, Result, SessionStatus, SetExecution,
    WorkoutSession,
};
use uuid::Uuid;

/// Behaviour switches for a store instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Permit `edit_set` on already completed sets
    pub allow_set_edits: bool,
}

/// Identifies the session generation a timer was started for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerToken(u64);

/// Handle returned by `subscribe`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&WorkoutSession)>;

/// State container for one workout at a time
pub struct WorkoutSessionStore<C: Clock = SystemClock> {
    clock: C,
    options: StoreOptions,
    session: WorkoutSession,
    generation: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for WorkoutSessionStore<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> WorkoutSessionStore<C> {
    pub fn new(clock: C) -> Self {
        Self::with_options(clock, StoreOptions::default())
    }

    pub fn with_options(clock: C, options: StoreOptions) -> Self {
        Self {
            clock,
            options,
            session: WorkoutSession::default(),
            generation: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------------

    /// Current session state
    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    /// Whether `advance_exercise` would move to another exercise
    pub fn has_next_exercise(&self) -> bool {
        match self.session.active_exercise_index {
            Some(idx) => idx + 1 < self.session.exercises.len(),
            None => false,
        }
    }

    /// Token to hand to the timer driving this session
    pub fn timer_token(&self) -> TimerToken {
        TimerToken(self.generation)
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    /// Register a listener called after every state change
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&WorkoutSession) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        let session = &self.session;
        for (_, listener) in self.listeners.iter_mut() {
            listener(session);
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Start a fresh session, discarding whatever the store held before
    pub fn start_session(&mut self, exercises: Vec<ExercisePlan>) -> Result<()> {
        if exercises.is_empty() {
            return Err(Error::invalid("a session needs at least one exercise"));
        }
        if let Some(plan) = exercises.iter().find(|p| p.exercise_id.trim().is_empty()) {
            return Err(Error::invalid(format!(
                "exercise id must not be empty ({} sets)",
                plan.sets.len()
            )));
        }
        for plan in &exercises {
            for target in &plan.sets {
                check_weight(target.target_weight)?;
            }
        }

        if self.session.status.is_running() {
            tracing::info!(
                "Superseding running session {} with a new one",
                self.session.id
            );
        }

        self.generation += 1;
        self.session = WorkoutSession {
            id: Uuid::new_v4(),
            status: SessionStatus::Active,
            started_at: Some(self.clock.now()),
            finished_at: None,
            elapsed_seconds: 0,
            exercises: exercises.into_iter().map(ExerciseExecution::from).collect(),
            active_exercise_index: Some(0),
            rest_remaining_seconds: None,
        };

        tracing::debug!(
            "Started session {} with {} exercises",
            self.session.id,
            self.session.exercises.len()
        );
        self.notify();
        Ok(())
    }

    /// Complete the session and hand back its final snapshot
    pub fn finish_session(&mut self) -> Result<WorkoutSession> {
        self.require_running("finish session")?;

        self.generation += 1;
        self.session.status = SessionStatus::Completed;
        self.session.finished_at = Some(self.clock.now());
        self.session.rest_remaining_seconds = None;

        tracing::info!(
            "Finished session {} after {}s ({} sets completed)",
            self.session.id,
            self.session.elapsed_seconds,
            self.session.completed_sets()
        );
        self.notify();
        Ok(self.session.clone())
    }

    /// Drop all in-progress data and return to idle
    pub fn cancel_session(&mut self) {
        if self.session.status != SessionStatus::Idle {
            tracing::info!("Cancelled session {}", self.session.id);
        }
        self.generation += 1;
        self.session = WorkoutSession::default();
        self.notify();
    }

    // ------------------------------------------------------------------------
    // Sets and exercises
    // ------------------------------------------------------------------------

    /// Record the result of a set. Allowed while active or resting.
    pub fn complete_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        actual: ActualSet,
    ) -> Result<()> {
        self.require_running("complete set")?;
        check_weight(actual.weight)?;
        let now = self.clock.now();

        let set = self.set_mut(exercise_index, set_index)?;
        if set.completed {
            return Err(Error::AlreadyCompleted {
                exercise_index,
                set_index,
            });
        }

        set.actual_reps = Some(actual.reps);
        set.actual_weight = actual.weight;
        set.completed = true;
        set.completed_at = Some(now);

        tracing::debug!(
            "Completed set {} of exercise {}: {} reps",
            set_index,
            exercise_index,
            actual.reps
        );
        self.notify();
        Ok(())
    }

    /// Correct the logged values of a completed set
    ///
    /// Only available when the store was built with `allow_set_edits`.
    pub fn edit_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        actual: ActualSet,
    ) -> Result<()> {
        if !self.options.allow_set_edits {
            return Err(Error::EditDisabled);
        }
        self.require_running("edit set")?;
        check_weight(actual.weight)?;

        let set = self.set_mut(exercise_index, set_index)?;
        if !set.completed {
            return Err(Error::InvalidState(format!(
                "set {} of exercise {} has not been completed yet",
                set_index, exercise_index
            )));
        }

        set.actual_reps = Some(actual.reps);
        set.actual_weight = actual.weight;

        tracing::debug!("Edited set {} of exercise {}", set_index, exercise_index);
        self.notify();
        Ok(())
    }

    /// Move to the next exercise. Returns false (and changes nothing) at the end.
    pub fn advance_exercise(&mut self) -> Result<bool> {
        self.require_running("advance exercise")?;
        if !self.has_next_exercise() {
            return Ok(false);
        }

        let next = self.session.active_exercise_index.map_or(0, |idx| idx + 1);
        self.session.active_exercise_index = Some(next);
        self.session.status = SessionStatus::Active;
        self.session.rest_remaining_seconds = None;

        tracing::debug!("Advanced to exercise {}", next);
        self.notify();
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Rest timer
    // ------------------------------------------------------------------------

    pub fn start_rest(&mut self, duration_seconds: u32) -> Result<()> {
        if duration_seconds == 0 {
            return Err(Error::invalid("rest duration must be positive"));
        }
        if self.session.status != SessionStatus::Active {
            return Err(Error::InvalidState(format!(
                "cannot start rest while {:?}",
                self.session.status
            )));
        }

        self.session.status = SessionStatus::Resting;
        self.session.rest_remaining_seconds = Some(duration_seconds);

        tracing::debug!("Resting for {}s", duration_seconds);
        self.notify();
        Ok(())
    }

    /// End the rest early. A no-op when the rest already ran out.
    pub fn skip_rest(&mut self) -> Result<()> {
        match self.session.status {
            SessionStatus::Resting => {
                self.end_rest();
                tracing::debug!("Rest skipped");
                self.notify();
                Ok(())
            }
            SessionStatus::Active => Ok(()),
            status => Err(Error::InvalidState(format!(
                "cannot skip rest while {:?}",
                status
            ))),
        }
    }

    pub fn add_rest_time(&mut self, seconds: u32) -> Result<()> {
        if seconds == 0 {
            return Err(Error::invalid("added rest time must be positive"));
        }
        if self.session.status != SessionStatus::Resting {
            return Err(Error::InvalidState(format!(
                "cannot extend rest while {:?}",
                self.session.status
            )));
        }

        let remaining = self.session.rest_remaining_seconds.unwrap_or(0);
        self.session.rest_remaining_seconds = Some(remaining.saturating_add(seconds));
        self.notify();
        Ok(())
    }

    fn end_rest(&mut self) {
        self.session.status = SessionStatus::Active;
        self.session.rest_remaining_seconds = None;
    }

    // ------------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------------

    /// One second of session time. Returns whether anything changed.
    pub fn tick_elapsed(&mut self, token: TimerToken) -> bool {
        if !self.accepts(token) {
            return false;
        }
        self.session.elapsed_seconds += 1;
        self.notify();
        true
    }

    /// One second of rest countdown. Returns whether anything changed.
    ///
    /// Reaching zero switches back to active; further ticks are no-ops.
    pub fn tick_rest(&mut self, token: TimerToken) -> bool {
        if !self.accepts(token) || self.session.status != SessionStatus::Resting {
            return false;
        }

        let remaining = self
            .session
            .rest_remaining_seconds
            .unwrap_or(0)
            .saturating_sub(1);
        if remaining == 0 {
            self.end_rest();
            tracing::debug!("Rest finished");
        } else {
            self.session.rest_remaining_seconds = Some(remaining);
        }
        self.notify();
        true
    }

    /// Deliver a one-second tick to both the session clock and the rest timer
    pub fn tick(&mut self, token: TimerToken) -> bool {
        let elapsed = self.tick_elapsed(token);
        let rest = self.tick_rest(token);
        elapsed || rest
    }

    fn accepts(&self, token: TimerToken) -> bool {
        token.0 == self.generation && self.session.status.is_running()
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn require_running(&self, operation: &str) -> Result<()> {
        if self.session.status.is_running() {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "cannot {} while {:?}",
                operation, self.session.status
            )))
        }
    }

    fn set_mut(&mut self, exercise_index: usize, set_index: usize) -> Result<&mut SetExecution> {
        let exercise = self
            .session
            .exercises
            .get_mut(exercise_index)
            .ok_or_else(|| Error::NotFound(format!("exercise {}", exercise_index)))?;
        exercise.sets.get_mut(set_index).ok_or_else(|| {
            Error::NotFound(format!("set {} of exercise {}", set_index, exercise_index))
        })
    }
}

/// Weights are kilograms: finite and not negative
fn check_weight(weight: Option<f64>) -> Result<()> {
    match weight {
        Some(kg) if !kg.is_finite() || kg < 0.0 => Err(Error::invalid(format!(
            "weight must be a non-negative number, got {}",
            kg
        ))),
        _ => Ok(()),
    }
}
