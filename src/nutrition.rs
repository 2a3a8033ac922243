use serde::{Deserialize, Serialize};
use validator::Validate;

/// Energy and macros per 100 g (or 100 ml) of a food.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Validate)]
pub struct Per100g {
    #[validate(range(min = 0.0, max = 10000.0))]
    pub calories: f64,
    #[validate(range(min = 0.0, max = 10000.0))]
    pub protein_g: f64,
    #[validate(range(min = 0.0, max = 10000.0))]
    pub fat_g: f64,
    #[validate(range(min = 0.0, max = 10000.0))]
    pub carbs_g: f64,
}

/// Zero for negative, NaN and infinite amounts.
pub(crate) fn non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

/// Absolute amounts for one serving.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Nutrition {
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

impl Per100g {
    /// Scales to `serving_grams` and rounds every value to a whole unit.
    /// Negative or non-finite results are clamped to zero.
    pub fn scale(&self, serving_grams: f64) -> Nutrition {
        let m = serving_grams / 100.0;
        let amt = |v: f64| non_negative((non_negative(v) * m).round());
        Nutrition {
            calories: amt(self.calories),
            protein_g: amt(self.protein_g),
            fat_g: amt(self.fat_g),
            carbs_g: amt(self.carbs_g),
        }
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, rhs: Nutrition) -> Nutrition {
        Nutrition {
            calories: self.calories + rhs.calories,
            protein_g: self.protein_g + rhs.protein_g,
            fat_g: self.fat_g + rhs.fat_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
        }
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Nutrition>>(iter: I) -> Self {
        iter.fold(Nutrition::default(), |acc, n| acc + n)
    }
}
