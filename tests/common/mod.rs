#![allow(dead_code)]

use chrono::NaiveDate;
use smacross::domain::close::ClosePoint;
use smacross::domain::error::SmacrossError;
use smacross::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<ClosePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, symbol: &str, points: Vec<ClosePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClosePoint>, SmacrossError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SmacrossError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start && p.date <= end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SmacrossError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SmacrossError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(points) if !points.is_empty() => {
                let min = points.iter().map(|p| p.date).min().unwrap();
                let max = points.iter().map(|p| p.date).max().unwrap();
                Ok(Some((min, max, points.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_point(date_str: &str, close: f64) -> ClosePoint {
    ClosePoint {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        close,
    }
}

/// Daily closes starting at `start_date`, one point per value.
pub fn make_series(start_date: &str, closes: &[f64]) -> Vec<ClosePoint> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| ClosePoint {
            date: start + chrono::Duration::days(i as i64),
            close,
        })
        .collect()
}

/// The hand-derivable series: with SMA(2)/SMA(4) the strategy stays long and
/// finishes at 125/105.
pub fn reference_closes() -> Vec<f64> {
    vec![
        100.0, 102.0, 101.0, 105.0, 110.0, 108.0, 115.0, 120.0, 118.0, 125.0,
    ]
}
