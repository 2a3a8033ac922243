mod food;
mod water;

pub use food::{FoodLog, FoodLogEntry};
pub use water::WaterLog;
