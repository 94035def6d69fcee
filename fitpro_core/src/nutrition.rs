//! Nutrition engine: basal/total energy expenditure and macro splits.
//!
//! Every function here is pure. Identical inputs always produce identical
//! outputs, and nothing is cached between calls.
//!
//! Formulas:
//! - Mifflin-St Jeor BMR: `9.99·kg + 6.25·cm − 4.92·age` (+5 male, −161 female)
//! - Tinsley total weight: `24.8·kg + 10`
//! - Tinsley lean mass: `25.3·LBM + 284`, with `LBM = kg·(1 − bf/100)`
//! - Atwater factors: protein 4 kcal/g, fat 9 kcal/g, carbohydrate 4 kcal/g

use crate::{
    AnthropometricInput, EnergyEstimate, Error, GetMethod, Goal, MacroBreakdown, MacroPlan,
    Result, Sex,
};

pub const PROTEIN_KCAL_PER_GRAM: f64 = 4.0;
pub const FAT_KCAL_PER_GRAM: f64 = 9.0;
pub const CARB_KCAL_PER_GRAM: f64 = 4.0;

/// Protein and fat targets in grams per kg of body weight
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MacroRatios {
    pub protein: f64,
    pub fat: f64,
}

/// Ratios used for a goal
pub fn ratios_for(goal: Goal) -> MacroRatios {
    match goal {
        Goal::Default | Goal::Maintenance => MacroRatios {
            protein: 2.0,
            fat: 0.8,
        },
        Goal::WeightLoss => MacroRatios {
            protein: 2.2,
            fat: 0.7,
        },
        Goal::Hypertrophy => MacroRatios {
            protein: 2.0,
            fat: 1.0,
        },
    }
}

fn require_positive(value: f64, name: &str) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(format!("{} must be a positive number, got {}", name, value)))
    }
}

/// Mifflin-St Jeor basal metabolic rate (kcal/day)
///
/// # Errors
///
/// `InvalidInput` if weight, height or age is not positive.
pub fn calculate_mifflin(input: &AnthropometricInput) -> Result<f64> {
    require_positive(input.weight, "weight")?;
    require_positive(input.height, "height")?;
    if input.age == 0 {
        return Err(Error::invalid("age must be a positive integer"));
    }

    let base = 9.99 * input.weight + 6.25 * input.height - 4.92 * f64::from(input.age);
    Ok(match input.sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    })
}

/// Tinsley total-weight energy expenditure (kcal/day)
pub fn calculate_tinsley_total(weight: f64) -> Result<f64> {
    require_positive(weight, "weight")?;
    Ok(24.8 * weight + 10.0)
}

/// Tinsley lean-body-mass energy expenditure (kcal/day)
///
/// # Errors
///
/// `InvalidInput` if weight is not positive or body fat lies outside `[0, 100)`.
/// 100% body fat would mean zero lean mass and is rejected rather than
/// returning the bare intercept.
pub fn calculate_tinsley_lbm(weight: f64, body_fat_percent: f64) -> Result<f64> {
    require_positive(weight, "weight")?;
    if !(0.0..100.0).contains(&body_fat_percent) {
        return Err(Error::invalid(format!(
            "body fat must be within [0, 100), got {}",
            body_fat_percent
        )));
    }

    let lean_mass = weight * (1.0 - body_fat_percent / 100.0);
    Ok(25.3 * lean_mass + 284.0)
}

/// Mifflin BMR scaled by the activity multiplier
pub fn calculate_activity_adjusted(input: &AnthropometricInput) -> Result<f64> {
    require_positive(input.activity_level, "activity level")?;
    Ok(calculate_mifflin(input)? * input.activity_level)
}

/// Split a calorie target into protein, fat and carbohydrate
///
/// Protein and fat are fixed by body weight; carbohydrate takes whatever is
/// left. A negative remainder yields `feasible == false`.
pub fn calculate_macros(total_calories: f64, weight: f64, goal: Goal) -> Result<MacroPlan> {
    require_positive(total_calories, "total calories")?;
    require_positive(weight, "weight")?;

    let ratios = ratios_for(goal);

    let protein_grams = ratios.protein * weight;
    let protein_calories = protein_grams * PROTEIN_KCAL_PER_GRAM;
    let fat_grams = ratios.fat * weight;
    let fat_calories = fat_grams * FAT_KCAL_PER_GRAM;
    let carb_calories = total_calories - (protein_calories + fat_calories);
    let carb_grams = carb_calories / CARB_KCAL_PER_GRAM;

    let share = |calories: f64| calories / total_calories * 100.0;
    let feasible = carb_calories >= 0.0;

    if !feasible {
        tracing::debug!(
            "Macro plan infeasible for {:?}: protein+fat need {} kcal of {}",
            goal,
            protein_calories + fat_calories,
            total_calories
        );
    }

    Ok(MacroPlan {
        protein: MacroBreakdown {
            grams: protein_grams,
            calories: protein_calories,
            percentage: share(protein_calories),
        },
        fats: MacroBreakdown {
            grams: fat_grams,
            calories: fat_calories,
            percentage: share(fat_calories),
        },
        carbs: MacroBreakdown {
            grams: carb_grams,
            calories: carb_calories,
            percentage: share(carb_calories),
        },
        total_calories,
        feasible,
    })
}

/// Compute every supported estimate and choose the GET
///
/// Tinsley lean-mass is preferred when body fat is known, otherwise Tinsley
/// total-weight. The activity-adjusted Mifflin value is reported alongside.
pub fn estimate_energy(input: &AnthropometricInput) -> Result<EnergyEstimate> {
    let mifflin = calculate_mifflin(input)?;
    let activity_adjusted = calculate_activity_adjusted(input)?;
    let tinsley_total = calculate_tinsley_total(input.weight)?;
    let tinsley_lbm = input
        .body_fat
        .map(|bf| calculate_tinsley_lbm(input.weight, bf))
        .transpose()?;

    let (get, method) = match tinsley_lbm {
        Some(lbm) => (lbm, GetMethod::TinsleyLbm),
        None => (tinsley_total, GetMethod::TinsleyTotal),
    };

    Ok(EnergyEstimate {
        mifflin,
        activity_adjusted,
        tinsley_total,
        tinsley_lbm,
        get,
        method,
    })
}
