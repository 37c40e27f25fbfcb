//! CSV file data adapter.
//!
//! Reads one tabular source with `timestamp` and `close` columns resolved by
//! header name; every symbol maps to the same file.

use crate::domain::close::ClosePoint;
use crate::domain::error::SmacrossError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<Vec<ClosePoint>, SmacrossError> {
        let content = fs::read_to_string(&self.path).map_err(|e| SmacrossError::DataSource {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| SmacrossError::DataSource {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();
        let timestamp_col = column_index(&headers, "timestamp")?;
        let close_col = column_index(&headers, "close")?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| SmacrossError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record
                .get(timestamp_col)
                .ok_or_else(|| SmacrossError::DataSource {
                    reason: "short CSV record: missing timestamp field".into(),
                })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                SmacrossError::DataSource {
                    reason: format!("invalid timestamp {:?}: {}", date_str, e),
                }
            })?;

            let close: f64 = record
                .get(close_col)
                .ok_or_else(|| SmacrossError::DataSource {
                    reason: "short CSV record: missing close field".into(),
                })?
                .parse()
                .map_err(|e| SmacrossError::DataSource {
                    reason: format!("invalid close value: {}", e),
                })?;

            points.push(ClosePoint { date, close });
        }

        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Ok(points)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, SmacrossError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| SmacrossError::DataSource {
            reason: format!("missing {} column", name),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        _symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClosePoint>, SmacrossError> {
        let points = self.read_all()?;
        Ok(points
            .into_iter()
            .filter(|p| p.date >= start && p.date <= end)
            .collect())
    }

    fn get_data_range(
        &self,
        _symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SmacrossError> {
        let points = self.read_all()?;
        match (points.first(), points.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, points.len()))),
            _ => Ok(None),
        }
    }
}
