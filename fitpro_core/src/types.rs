//! Core domain types for the FIT PRO domain core.
//!
//! This module defines the value objects shared by the engine and the store:
//! - Anthropometric inputs and energy/macro results
//! - Workout session, exercise and set execution records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Nutrition Types
// ============================================================================

/// Biological sex used by the Mifflin-St Jeor offset
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// Training goal driving the protein/fat ratios
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    #[default]
    Default,
    /// "emagrecimento"
    WeightLoss,
    /// "hipertrofia"
    Hypertrophy,
    /// "manutencao"; uses the default ratios
    Maintenance,
}

impl Goal {
    /// Parse a goal label. Unknown labels fall back to `Goal::Default`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "emagrecimento" | "weight_loss" | "weightloss" => Goal::WeightLoss,
            "hipertrofia" | "hypertrophy" => Goal::Hypertrophy,
            "manutencao" | "manutenção" | "maintenance" => Goal::Maintenance,
            _ => Goal::Default,
        }
    }
}

impl From<&str> for Goal {
    fn from(label: &str) -> Self {
        Goal::parse(label)
    }
}

/// Anthropometric measurements for a single calculation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnthropometricInput {
    /// Body weight in kg
    pub weight: f64,
    /// Height in cm
    pub height: f64,
    /// Age in years
    pub age: u32,
    pub sex: Sex,
    /// Body fat percentage, if measured
    pub body_fat: Option<f64>,
    /// Activity multiplier applied to the Mifflin BMR
    pub activity_level: f64,
}

/// Formula that produced `EnergyEstimate::get`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GetMethod {
    TinsleyLbm,
    TinsleyTotal,
}

/// Energy expenditure estimates (kcal/day)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EnergyEstimate {
    pub mifflin: f64,
    /// Mifflin BMR multiplied by the activity level
    pub activity_adjusted: f64,
    pub tinsley_total: f64,
    /// Only present when body fat was supplied
    pub tinsley_lbm: Option<f64>,
    /// Chosen total daily energy expenditure
    pub get: f64,
    pub method: GetMethod,
}

/// Grams, calories and share of total calories for one macronutrient
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MacroBreakdown {
    pub grams: f64,
    pub calories: f64,
    pub percentage: f64,
}

/// Daily macronutrient split
///
/// `carbs.grams` is negative when protein and fat alone exceed the calorie
/// target. That case is reported through `feasible`, never clamped.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MacroPlan {
    pub protein: MacroBreakdown,
    pub fats: MacroBreakdown,
    pub carbs: MacroBreakdown,
    pub total_calories: f64,
    pub feasible: bool,
}

// ============================================================================
// Workout Session Types
// ============================================================================

/// Lifecycle status of a workout session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Active,
    Resting,
    Completed,
}

impl SessionStatus {
    /// Whether the session clock is running
    pub fn is_running(self) -> bool {
        matches!(self, SessionStatus::Active | SessionStatus::Resting)
    }
}

/// Prescribed target for one set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetTarget {
    pub target_reps: u32,
    pub target_weight: Option<f64>,
}

/// An exercise as prescribed when a session starts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExercisePlan {
    pub exercise_id: String,
    pub sets: Vec<SetTarget>,
}

/// What the athlete actually performed for a set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActualSet {
    pub reps: u32,
    pub weight: Option<f64>,
}

/// Execution record for a single set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetExecution {
    pub set_index: usize,
    pub target_reps: u32,
    pub target_weight: Option<f64>,
    pub actual_reps: Option<u32>,
    pub actual_weight: Option<f64>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SetExecution {
    /// Build a pending set from its target
    pub fn pending(set_index: usize, target: SetTarget) -> Self {
        Self {
            set_index,
            target_reps: target.target_reps,
            target_weight: target.target_weight,
            actual_reps: None,
            actual_weight: None,
            completed: false,
            completed_at: None,
        }
    }

    /// Reps times weight for a completed, weighted set
    pub fn volume(&self) -> f64 {
        match (self.completed, self.actual_reps, self.actual_weight) {
            (true, Some(reps), Some(weight)) => reps as f64 * weight,
            _ => 0.0,
        }
    }
}

/// Execution record for one exercise in a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseExecution {
    pub exercise_id: String,
    pub sets: Vec<SetExecution>,
}

impl ExerciseExecution {
    pub fn is_complete(&self) -> bool {
        self.sets.iter().all(|s| s.completed)
    }
}

impl From<ExercisePlan> for ExerciseExecution {
    fn from(plan: ExercisePlan) -> Self {
        let sets = plan
            .sets
            .into_iter()
            .enumerate()
            .map(|(i, target)| SetExecution::pending(i, target))
            .collect();
        Self {
            exercise_id: plan.exercise_id,
            sets,
        }
    }
}

/// State of one workout session, owned by `WorkoutSessionStore`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: u64,
    pub exercises: Vec<ExerciseExecution>,
    pub active_exercise_index: Option<usize>,
    pub rest_remaining_seconds: Option<u32>,
}

impl WorkoutSession {
    /// The exercise currently being performed
    pub fn active_exercise(&self) -> Option<&ExerciseExecution> {
        self.active_exercise_index
            .and_then(|idx| self.exercises.get(idx))
    }

    /// Number of sets marked completed across all exercises
    pub fn completed_sets(&self) -> usize {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter(|s| s.completed)
            .count()
    }

    /// Total volume (reps x kg) across completed sets
    pub fn total_volume(&self) -> f64 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .map(SetExecution::volume)
            .sum()
    }
}
