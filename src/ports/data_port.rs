//! Price-data access port trait.

use crate::domain::close::ClosePoint;
use crate::domain::error::SmacrossError;
use chrono::NaiveDate;

pub trait DataPort {
    /// Closing prices for `symbol` within `[start, end]` inclusive, sorted
    /// ascending by date with no duplicate dates.
    fn fetch_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ClosePoint>, SmacrossError>;

    /// `(first, last, count)` of the full series, `None` when empty.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SmacrossError>;
}
