use serde::{Deserialize, Serialize};
use time::Date;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WaterLogEntry {
    pub date: Date,
    pub ml: u32,
}

/// Cumulative water intake per day, kept sorted by date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct WaterLog {
    days: Vec<WaterLogEntry>,
}

impl WaterLog {
    #[cfg(test)]
    pub fn days(&self) -> &[WaterLogEntry] {
        &self.days
    }

    pub fn consumed_on(&self, date: Date) -> u32 {
        self.days
            .iter()
            .find(|d| d.date == date)
            .map(|d| d.ml)
            .unwrap_or(0)
    }

    fn day_mut(&mut self, date: Date) -> &mut WaterLogEntry {
        let idx = match self.days.binary_search_by_key(&date, |d| d.date) {
            Ok(i) => i,
            Err(i) => {
                self.days.insert(i, WaterLogEntry { date, ml: 0 });
                i
            }
        };
        &mut self.days[idx]
    }

    pub fn add(&mut self, date: Date, ml: u32) -> u32 {
        let day = self.day_mut(date);
        day.ml = day.ml.saturating_add(ml);
        day.ml
    }

    /// Takes back `ml`, never going below zero.
    pub fn undo(&mut self, date: Date, ml: u32) -> u32 {
        let day = self.day_mut(date);
        day.ml = day.ml.saturating_sub(ml);
        day.ml
    }

    pub fn reset(&mut self, date: Date) {
        self.day_mut(date).ml = 0;
    }

    pub fn retain_recent(&mut self, keep: usize) {
        if self.days.len() > keep {
            let excess = self.days.len() - keep;
            self.days.drain(..excess);
        }
    }
}
