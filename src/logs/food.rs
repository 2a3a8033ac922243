use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::nutrition::{non_negative, Nutrition};

/// A single logged consumption event. Never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodLogEntry {
    pub id: Uuid,
    pub date: Date,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
}

impl FoodLogEntry {
    pub fn new(date: Date, name: impl Into<String>, n: Nutrition) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            name: name.into(),
            calories: non_negative(n.calories),
            protein_g: non_negative(n.protein_g),
            fat_g: non_negative(n.fat_g),
            carbs_g: non_negative(n.carbs_g),
        }
    }

    pub fn nutrition(&self) -> Nutrition {
        Nutrition {
            calories: self.calories,
            protein_g: self.protein_g,
            fat_g: self.fat_g,
            carbs_g: self.carbs_g,
        }
    }
}

/// Append-only ordered log, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FoodLog {
    entries: Vec<FoodLogEntry>,
}

impl FoodLog {
    pub fn entries(&self) -> &[FoodLogEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn append(&mut self, entry: FoodLogEntry) -> &FoodLogEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn delete(&mut self, id: Uuid) -> Option<FoodLogEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    /// Delete followed by reinsert under a fresh id.
    pub fn replace(&mut self, id: Uuid, date: Date, name: String, n: Nutrition) -> Option<&FoodLogEntry> {
        self.delete(id)?;
        Some(self.append(FoodLogEntry::new(date, name, n)))
    }

    pub fn on(&self, date: Date) -> impl Iterator<Item = &FoodLogEntry> {
        self.entries.iter().filter(move |e| e.date == date)
    }

    pub fn totals_on(&self, date: Date) -> Nutrition {
        self.on(date).map(FoodLogEntry::nutrition).sum()
    }

    /// Drops everything but the most recent `keep` entries.
    pub fn retain_recent(&mut self, keep: usize) {
        if self.entries.len() > keep {
            let excess = self.entries.len() - keep;
            self.entries.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn meal(cal: f64) -> Nutrition {
        Nutrition {
            calories: cal,
            protein_g: 10.0,
            fat_g: 5.0,
            carbs_g: 20.0,
        }
    }

    #[test]
    fn totals_only_include_selected_date() {
        let mut log = FoodLog::default();
        log.append(FoodLogEntry::new(date!(2026 - 01 - 15), "100g of Roti", meal(297.0)));
        log.append(FoodLogEntry::new(date!(2026 - 01 - 15), "100g of Dal", meal(116.0)));
        log.append(FoodLogEntry::new(date!(2026 - 01 - 16), "100g of Rice", meal(130.0)));

        let t = log.totals_on(date!(2026 - 01 - 15));
        assert_eq!(t.calories, 413.0);
        assert_eq!(t.protein_g, 20.0);
        assert_eq!(log.on(date!(2026 - 01 - 16)).count(), 1);
        assert_eq!(log.totals_on(date!(2026 - 01 - 17)), Nutrition::default());
    }

    #[test]
    fn delete_removes_only_that_entry() {
        let mut log = FoodLog::default();
        let a = log.append(FoodLogEntry::new(date!(2026 - 01 - 15), "a", meal(1.0))).id;
        let b = log.append(FoodLogEntry::new(date!(2026 - 01 - 15), "b", meal(2.0))).id;
        assert_eq!(log.delete(a).map(|e| e.name), Some("a".to_string()));
        assert!(log.delete(a).is_none());
        assert_eq!(log.entries()[0].id, b);
    }

    #[test]
    fn replace_issues_a_new_id_at_the_end() {
        let mut log = FoodLog::default();
        let a = log.append(FoodLogEntry::new(date!(2026 - 01 - 15), "a", meal(1.0))).id;
        log.append(FoodLogEntry::new(date!(2026 - 01 - 15), "b", meal(2.0)));
        let new_id = log
            .replace(a, date!(2026 - 01 - 15), "a2".into(), meal(3.0))
            .map(|e| e.id)
            .unwrap();
        assert_ne!(new_id, a);
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[1].name, "a2");
        assert!(log.replace(Uuid::new_v4(), date!(2026 - 01 - 15), "x".into(), meal(0.0)).is_none());
    }

    #[test]
    fn non_finite_amounts_are_stored_as_zero() {
        let e = FoodLogEntry::new(
            date!(2026 - 01 - 15),
            "x",
            Nutrition {
                calories: f64::INFINITY,
                protein_g: f64::NAN,
                fat_g: -3.0,
                carbs_g: 4.0,
            },
        );
        assert_eq!(e.nutrition(), Nutrition { calories: 0.0, protein_g: 0.0, fat_g: 0.0, carbs_g: 4.0 });
        assert!(serde_json::to_value(&e).unwrap()["calories"].is_number());
    }

    #[test]
    fn retention_keeps_most_recent() {
        let mut log = FoodLog::default();
        for i in 0..105 {
            log.append(FoodLogEntry::new(date!(2026 - 01 - 15), format!("item {i}"), meal(1.0)));
        }
        log.retain_recent(100);
        assert_eq!(log.len(), 100);
        assert_eq!(log.entries()[0].name, "item 5");
        assert_eq!(log.entries()[99].name, "item 104");
    }

    #[test]
    fn serializes_as_plain_array_with_iso_dates() {
        let mut log = FoodLog::default();
        log.append(FoodLogEntry::new(date!(2026 - 01 - 15), "x", meal(1.0)));
        let v = serde_json::to_value(&log).unwrap();
        assert!(v.is_array());
        assert_eq!(v[0]["date"], "2026-01-15");
        let back: FoodLog = serde_json::from_value(v).unwrap();
        assert_eq!(back, log);
    }
}
