//! Body-composition and daily target estimation.
//!
//! Body fat follows the U.S. Navy circumference method; energy needs follow
//! Katch-McArdle on lean mass, scaled by a fixed activity multiplier.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::profile::{Gender, Profile};

pub const DEFAULT_ACTIVITY_MULTIPLIER: f64 = 1.35;
pub const DEFAULT_FIXED_KCAL_DELTA: f64 = 500.0;
pub const DEFAULT_FAT_RATIO: f64 = 0.25;
pub const DEFAULT_CARB_RATIO: f64 = 0.45;
pub const DEFAULT_PROTEIN_PER_LEAN_KG: f64 = 2.2;
pub const DEFAULT_KCAL_PER_KG: f64 = 7700.0;
/// Months are approximated as 30 days.
pub const DEFAULT_DAYS_PER_MONTH: f64 = 30.0;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

#[derive(Debug, Error, PartialEq)]
pub enum MetricsError {
    #[error("invalid anthropometry: {0}")]
    InvalidAnthropometry(String),
}

/// How the daily calorie target departs from TDEE.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CalorieMode {
    /// Spread the weight change to goal evenly over `months_to_goal`.
    DeficitFromTimeline,
    /// Subtract a constant number of kcal.
    FixedDelta,
}

/// How the carbohydrate target is derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CarbMode {
    /// Whatever calories remain after protein and fat.
    Remainder,
    /// A fixed share of target calories.
    FixedRatio,
}

impl std::str::FromStr for CalorieMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deficit_from_timeline" | "timeline" => Ok(Self::DeficitFromTimeline),
            "fixed_delta" | "fixed" => Ok(Self::FixedDelta),
            other => Err(format!("unknown calorie mode: {other}")),
        }
    }
}

impl std::str::FromStr for CarbMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remainder" => Ok(Self::Remainder),
            "fixed_ratio" | "ratio" => Ok(Self::FixedRatio),
            other => Err(format!("unknown carb mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub activity_multiplier: f64,
    pub calorie_mode: CalorieMode,
    pub fixed_kcal_delta: f64,
    pub fat_ratio: f64,
    pub carb_mode: CarbMode,
    pub carb_ratio: f64,
    pub protein_per_lean_kg: f64,
    pub kcal_per_kg: f64,
    pub days_per_month: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            activity_multiplier: DEFAULT_ACTIVITY_MULTIPLIER,
            calorie_mode: CalorieMode::DeficitFromTimeline,
            fixed_kcal_delta: DEFAULT_FIXED_KCAL_DELTA,
            fat_ratio: DEFAULT_FAT_RATIO,
            carb_mode: CarbMode::Remainder,
            carb_ratio: DEFAULT_CARB_RATIO,
            protein_per_lean_kg: DEFAULT_PROTEIN_PER_LEAN_KG,
            kcal_per_kg: DEFAULT_KCAL_PER_KG,
            days_per_month: DEFAULT_DAYS_PER_MONTH,
        }
    }
}

/// Result of a body-fat estimate. `derived == false` means the formula could not
/// be applied and `value` is the caller's stored body-fat percentage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BodyFatEstimate {
    pub value: f64,
    pub derived: bool,
}

/// Intermediate energy figures, all in kcal/day except `lean_mass_kg`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EnergyBudget {
    pub lean_mass_kg: f64,
    pub bmr: f64,
    pub tdee: f64,
    pub daily_delta: f64,
    pub target_calories: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MacroTargets {
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundedTargets {
    pub calories: i64,
    pub protein_g: i64,
    pub fat_g: i64,
    pub carbs_g: i64,
}

impl MacroTargets {
    pub fn rounded(&self) -> RoundedTargets {
        RoundedTargets {
            calories: self.calories.round() as i64,
            protein_g: self.protein_g.round() as i64,
            fat_g: self.fat_g.round() as i64,
            carbs_g: self.carbs_g.round() as i64,
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Navy-method body fat, rounded to one decimal.
pub fn navy_body_fat(profile: &Profile) -> Result<f64, MetricsError> {
    if !(profile.height_cm > 0.0) {
        return Err(MetricsError::InvalidAnthropometry(format!(
            "height must be positive, got {}",
            profile.height_cm
        )));
    }

    let bf = match profile.gender {
        Gender::Male => {
            let girth = profile.waist_cm - profile.neck_cm;
            if !(girth > 0.0) {
                return Err(MetricsError::InvalidAnthropometry(format!(
                    "waist ({}) must exceed neck ({})",
                    profile.waist_cm, profile.neck_cm
                )));
            }
            495.0 / (1.0324 - 0.19077 * girth.log10() + 0.15456 * profile.height_cm.log10())
                - 450.0
        }
        Gender::Female => {
            let hip = profile.hip_cm.ok_or_else(|| {
                MetricsError::InvalidAnthropometry("hip circumference is required".into())
            })?;
            let girth = profile.waist_cm + hip - profile.neck_cm;
            if !(girth > 0.0) {
                return Err(MetricsError::InvalidAnthropometry(format!(
                    "waist + hip ({}) must exceed neck ({})",
                    profile.waist_cm + hip,
                    profile.neck_cm
                )));
            }
            495.0 / (1.29579 - 0.35004 * girth.log10() + 0.22100 * profile.height_cm.log10())
                - 450.0
        }
    };

    if !bf.is_finite() {
        return Err(MetricsError::InvalidAnthropometry(
            "formula produced a non-finite value".into(),
        ));
    }
    Ok(round1(bf))
}

/// Estimate body fat, falling back to the stored value when the formula is undefined.
pub fn estimate_body_fat_percent(profile: &Profile) -> BodyFatEstimate {
    match navy_body_fat(profile) {
        Ok(value) => BodyFatEstimate {
            value,
            derived: true,
        },
        Err(e) => {
            debug!(error = %e, fallback = profile.body_fat_percent, "body fat estimate skipped");
            BodyFatEstimate {
                value: profile.body_fat_percent,
                derived: false,
            }
        }
    }
}

pub fn lean_mass_kg(profile: &Profile) -> f64 {
    profile.weight_kg * (1.0 - profile.body_fat_percent / 100.0)
}

/// Katch-McArdle.
pub fn bmr(lean_mass_kg: f64) -> f64 {
    370.0 + 21.6 * lean_mass_kg
}

pub fn compute_energy_budget(profile: &Profile, cfg: &MetricsConfig) -> EnergyBudget {
    let lean = lean_mass_kg(profile);
    let bmr = bmr(lean);
    let tdee = bmr * cfg.activity_multiplier;

    let daily_delta = match cfg.calorie_mode {
        CalorieMode::DeficitFromTimeline => {
            if profile.months_to_goal == 0 {
                0.0
            } else {
                (profile.weight_kg - profile.goal_weight_kg) * cfg.kcal_per_kg
                    / (f64::from(profile.months_to_goal) * cfg.days_per_month)
            }
        }
        CalorieMode::FixedDelta => cfg.fixed_kcal_delta,
    };

    EnergyBudget {
        lean_mass_kg: lean,
        bmr,
        tdee,
        daily_delta,
        target_calories: tdee - daily_delta,
    }
}

pub fn compute_macro_targets(profile: &Profile, cfg: &MetricsConfig) -> MacroTargets {
    let energy = compute_energy_budget(profile, cfg);
    macros_for_budget(&energy, cfg)
}

pub fn macros_for_budget(energy: &EnergyBudget, cfg: &MetricsConfig) -> MacroTargets {
    let calories = energy.target_calories;
    let protein_g = energy.lean_mass_kg * cfg.protein_per_lean_kg;
    let fat_g = calories * cfg.fat_ratio / KCAL_PER_G_FAT;
    let carbs_g = match cfg.carb_mode {
        CarbMode::Remainder => {
            (calories - protein_g * KCAL_PER_G_PROTEIN - fat_g * KCAL_PER_G_FAT) / KCAL_PER_G_CARBS
        }
        CarbMode::FixedRatio => calories * cfg.carb_ratio / KCAL_PER_G_CARBS,
    };

    MacroTargets {
        calories,
        protein_g,
        fat_g,
        carbs_g,
    }
}

/// Weight at which the current lean mass would sit at the goal body-fat percentage.
pub fn projected_goal_weight_kg(profile: &Profile) -> Option<f64> {
    let fat_share = profile.goal_body_fat_percent / 100.0;
    if !(0.0..1.0).contains(&fat_share) {
        return None;
    }
    Some(round1(lean_mass_kg(profile) / (1.0 - fat_share)))
}
