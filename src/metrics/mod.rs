mod engine;
mod profile;

pub use engine::{
    compute_energy_budget, compute_macro_targets, estimate_body_fat_percent,
    projected_goal_weight_kg, BodyFatEstimate, CalorieMode, CarbMode, EnergyBudget, MacroTargets,
    MetricsConfig, RoundedTargets,
};
pub use profile::{Measurements, Profile};
