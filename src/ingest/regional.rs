//! Built-in table of common Indian dishes (IFCT values, per 100 g).

use lazy_static::lazy_static;

use super::{FoodCandidate, FoodSource};
use crate::nutrition::Per100g;

struct Row {
    name: &'static str,
    calories: f64,
    protein_g: f64,
    fat_g: f64,
    carbs_g: f64,
}

const fn row(name: &'static str, calories: f64, protein_g: f64, fat_g: f64, carbs_g: f64) -> Row {
    Row {
        name,
        calories,
        protein_g,
        fat_g,
        carbs_g,
    }
}

const IFCT: [Row; 12] = [
    row("Roti (Whole Wheat)", 297.0, 9.0, 1.0, 61.0),
    row("Paneer (Raw)", 265.0, 18.0, 20.0, 1.2),
    row("Toor Dal (Cooked)", 116.0, 6.0, 0.4, 21.0),
    row("White Rice (Cooked)", 130.0, 2.7, 0.3, 28.0),
    row("Chicken Curry (Standard)", 145.0, 14.0, 8.0, 5.0),
    row("Mutton Dhansak", 180.0, 9.0, 8.0, 18.0),
    row("Chicken Fried Rice", 160.0, 6.0, 5.0, 22.0),
    row("Mutton Curry", 140.0, 12.0, 8.0, 5.0),
    row("Beef Fry (Kerala Style)", 220.0, 18.0, 15.0, 3.0),
    row("Pork Vindaloo", 250.0, 14.0, 18.0, 8.0),
    row("Chicken Tikka (Dry)", 150.0, 20.0, 7.0, 2.0),
    row("Egg Curry", 135.0, 11.0, 9.0, 3.0),
];

lazy_static! {
    static ref FOODS: Vec<FoodCandidate> = IFCT
        .iter()
        .enumerate()
        .map(|(i, r)| FoodCandidate {
            id: format!("ifct:{i}"),
            name: r.name.to_string(),
            brand: None,
            per_100g: Per100g {
                calories: r.calories,
                protein_g: r.protein_g,
                fat_g: r.fat_g,
                carbs_g: r.carbs_g,
            },
            source: FoodSource::Regional,
        })
        .collect();
}

/// Offline food table searched by case-insensitive substring.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionalFoodDb;

impl RegionalFoodDb {
    pub fn search(&self, query: &str) -> Vec<FoodCandidate> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        FOODS
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&q))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_ignores_case() {
        let hits = RegionalFoodDb.search("dhansak");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Mutton Dhansak");
        assert_eq!(hits[0].per_100g.calories, 180.0);
    }

    #[test]
    fn several_matches() {
        let names: Vec<_> = RegionalFoodDb
            .search("CHICKEN")
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            vec!["Chicken Curry (Standard)", "Chicken Fried Rice", "Chicken Tikka (Dry)"]
        );
    }

    #[test]
    fn no_match_and_blank_query_are_empty() {
        assert!(RegionalFoodDb.search("sushi").is_empty());
        assert!(RegionalFoodDb.search("   ").is_empty());
    }
}
