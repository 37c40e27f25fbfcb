//! Closing-price observation.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl ClosePoint {
    /// ln(close / prev_close)
    pub fn log_return_from(&self, prev_close: f64) -> f64 {
        (self.close / prev_close).ln()
    }
}
