//! Meal log records and photo storage keys.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A food swapped or adjusted relative to the meal plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModifiedFood {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

/// A student's logged meal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MealLog {
    pub student_id: String,
    pub meal_plan_id: Option<String>,
    pub meal_name: String,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub modified_foods: Option<Vec<ModifiedFood>>,
    pub created_at: DateTime<Utc>,
}

impl MealLog {
    pub fn new(
        student_id: impl Into<String>,
        meal_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            meal_plan_id: None,
            meal_name: meal_name.into(),
            photo_url: None,
            notes: None,
            modified_foods: None,
            created_at,
        }
    }

    /// Reject records the backend would refuse
    pub fn validate(&self) -> Result<()> {
        if self.student_id.trim().is_empty() {
            return Err(Error::invalid("meal log needs a student id"));
        }
        if self.meal_name.trim().is_empty() {
            return Err(Error::invalid("meal log needs a meal name"));
        }
        Ok(())
    }
}

/// Object-storage key for a meal photo: `{student_id}/{unix_millis}.{ext}`
///
/// The extension is lowercased and may be given with or without a dot.
pub fn photo_object_key(student_id: &str, taken_at: DateTime<Utc>, ext: &str) -> Result<String> {
    let student_id = student_id.trim();
    if student_id.is_empty() || student_id.contains('/') {
        return Err(Error::invalid(format!(
            "invalid student id for photo key: {:?}",
            student_id
        )));
    }

    let ext = ext.trim().trim_start_matches('.').to_lowercase();
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::invalid(format!("invalid photo extension: {:?}", ext)));
    }

    Ok(format!(
        "{}/{}.{}",
        student_id,
        taken_at.timestamp_millis(),
        ext
    ))
}
