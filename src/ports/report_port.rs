//! Report generation port trait.

use crate::domain::crossover::Evaluation;
use crate::domain::error::SmacrossError;
use std::path::Path;

/// Port for rendering the market and strategy cumulative curves.
pub trait ReportPort {
    fn write(
        &self,
        evaluation: &Evaluation,
        title: &str,
        output_path: &Path,
    ) -> Result<(), SmacrossError>;
}
