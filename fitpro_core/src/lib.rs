#![forbid(unsafe_code)]

//! Domain core for the FIT PRO coaching platform.
//!
//! This crate provides:
//! - Nutrition engine (BMR/GET estimates, macro splits)
//! - Workout session store (set logging, rest timer, elapsed time)
//! - Boundary records (finished sessions, meal logs, photo keys)
//! - Persistence sinks (WAL, CSV rollup) and history
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod clock;
pub mod nutrition;
pub mod session;
pub mod record;
pub mod meal_log;
pub mod config;
pub mod logging;
pub mod wal;
pub mod csv_rollup;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use nutrition::{
    calculate_activity_adjusted, calculate_macros, calculate_mifflin, calculate_tinsley_lbm,
    calculate_tinsley_total, estimate_energy,
};
pub use session::{StoreOptions, SubscriptionId, TimerToken, WorkoutSessionStore};
pub use record::SessionRecord;
pub use meal_log::{photo_object_key, MealLog, ModifiedFood};
pub use config::Config;
pub use wal::{JsonlSink, MealLogSink, SessionSink};
pub use history::{load_recent_sessions, summarize, HistorySummary};
