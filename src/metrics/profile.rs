use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

/// Anthropometric profile of a single user. Mutated in place by settings input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Profile {
    #[validate(range(min = 40.0, max = 200.0))]
    pub weight_kg: f64,
    #[validate(range(min = 100.0, max = 250.0))]
    pub height_cm: f64,
    #[validate(range(min = 10, max = 100))]
    pub age: u32,
    pub gender: Gender,
    #[validate(range(min = 0.0, max = 100.0))]
    pub neck_cm: f64,
    #[validate(range(min = 0.0, max = 250.0))]
    pub waist_cm: f64,
    /// Only consulted for `Gender::Female`.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 250.0))]
    pub hip_cm: Option<f64>,
    #[validate(range(min = 3.0, max = 50.0))]
    pub body_fat_percent: f64,
    #[validate(range(min = 40.0, max = 200.0))]
    pub goal_weight_kg: f64,
    #[validate(range(min = 3.0, max = 50.0))]
    pub goal_body_fat_percent: f64,
    #[validate(range(min = 1, max = 120))]
    pub months_to_goal: u32,
    #[validate(range(max = 10000))]
    pub water_goal_ml: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            weight_kg: 75.0,
            height_cm: 175.0,
            age: 17,
            gender: Gender::Male,
            neck_cm: 38.0,
            waist_cm: 85.0,
            hip_cm: None,
            body_fat_percent: 15.0,
            goal_weight_kg: 65.0,
            goal_body_fat_percent: 12.0,
            months_to_goal: 4,
            water_goal_ml: 3000,
        }
    }
}

/// Circumference measurements that may override the stored ones for a one-off estimate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Measurements {
    pub height_cm: Option<f64>,
    pub neck_cm: Option<f64>,
    pub waist_cm: Option<f64>,
    pub hip_cm: Option<f64>,
    pub gender: Option<Gender>,
}

impl Profile {
    pub fn with_measurements(&self, m: &Measurements) -> Profile {
        let mut p = self.clone();
        if let Some(v) = m.height_cm {
            p.height_cm = v;
        }
        if let Some(v) = m.neck_cm {
            p.neck_cm = v;
        }
        if let Some(v) = m.waist_cm {
            p.waist_cm = v;
        }
        if m.hip_cm.is_some() {
            p.hip_cm = m.hip_cm;
        }
        if let Some(g) = m.gender {
            p.gender = g;
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        assert!(Profile::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_weight_is_rejected() {
        let p = Profile {
            weight_kg: 20.0,
            ..Profile::default()
        };
        let errs = p.validate().unwrap_err();
        assert!(errs.field_errors().contains_key("weight_kg"));
    }

    #[test]
    fn zero_months_is_rejected_on_input() {
        let p = Profile {
            months_to_goal: 0,
            ..Profile::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn hip_is_optional_in_json() {
        let json = serde_json::json!({
            "weight_kg": 70.0, "height_cm": 170.0, "age": 30, "gender": "Female",
            "neck_cm": 33.0, "waist_cm": 75.0, "body_fat_percent": 25.0,
            "goal_weight_kg": 62.0, "goal_body_fat_percent": 22.0,
            "months_to_goal": 6, "water_goal_ml": 2500
        });
        let p: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(p.hip_cm, None);
        assert_eq!(p.gender, Gender::Female);
    }

    #[test]
    fn measurements_override_only_given_fields() {
        let base = Profile::default();
        let p = base.with_measurements(&Measurements {
            waist_cm: Some(90.0),
            ..Measurements::default()
        });
        assert_eq!(p.waist_cm, 90.0);
        assert_eq!(p.neck_cm, base.neck_cm);
        assert_eq!(p.height_cm, base.height_cm);
    }
}
