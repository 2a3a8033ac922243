use serde::{Deserialize, Serialize};

use crate::metrics::{BodyFatEstimate, EnergyBudget, MacroTargets, Profile, RoundedTargets};

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    #[serde(flatten)]
    pub profile: Profile,
    /// Replace `body_fat_percent` with the circumference estimate when it can be derived.
    #[serde(default)]
    pub derive_body_fat: bool,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
    pub body_fat: BodyFatEstimate,
}

#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub energy: EnergyBudget,
    pub targets: MacroTargets,
    pub display: RoundedTargets,
    pub projected_goal_weight_kg: Option<f64>,
}
