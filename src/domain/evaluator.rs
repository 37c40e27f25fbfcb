//! Stateful strategy evaluator: one price series, two rolling-mean columns,
//! and the most recent evaluation.
//!
//! The evaluation itself is the pure [`crossover`] core; this type only caches
//! the derived columns so that changing one window recomputes one column.

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::domain::close::ClosePoint;
use crate::domain::crossover::{self, Evaluation};
use crate::domain::error::SmacrossError;
use crate::domain::range::ParamRange;
use crate::domain::series::{log_returns, rolling_mean};
use crate::ports::data_port::DataPort;

/// One cell of an optimization grid, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub short_window: usize,
    pub long_window: usize,
    pub performance: f64,
}

/// The winning cell of an optimization sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationResult {
    pub short_window: usize,
    pub long_window: usize,
    pub performance: f64,
}

pub struct StrategyEvaluator {
    symbol: String,
    short_window: usize,
    long_window: usize,
    start: NaiveDate,
    end: NaiveDate,
    points: Vec<ClosePoint>,
    closes: Vec<f64>,
    returns: Vec<Option<f64>>,
    sma_short: Vec<Option<f64>>,
    sma_long: Vec<Option<f64>>,
    last_evaluation: Option<Evaluation>,
    grid: Option<Vec<GridPoint>>,
}

impl std::fmt::Debug for StrategyEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyEvaluator")
            .field("symbol", &self.symbol)
            .field("short_window", &self.short_window)
            .field("long_window", &self.long_window)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("rows", &self.points.len())
            .finish()
    }
}

impl StrategyEvaluator {
    /// Build an evaluator over an already-loaded series, sorted ascending by
    /// date. The date bounds are taken from the series itself.
    pub fn new(
        symbol: impl Into<String>,
        points: Vec<ClosePoint>,
        short_window: usize,
        long_window: usize,
    ) -> Result<Self, SmacrossError> {
        let symbol = symbol.into();
        validate_window("short_window", short_window)?;
        validate_window("long_window", long_window)?;

        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Err(SmacrossError::DataUnavailable { symbol });
        };
        let (start, end) = (first.date, last.date);

        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        let returns = log_returns(&closes);
        let sma_short = rolling_mean(&closes, short_window);
        let sma_long = rolling_mean(&closes, long_window);

        Ok(Self {
            symbol,
            short_window,
            long_window,
            start,
            end,
            points,
            closes,
            returns,
            sma_short,
            sma_long,
            last_evaluation: None,
            grid: None,
        })
    }

    /// Load the price series for `symbol` over `[start, end]` from a data
    /// port and build an evaluator. Fails when the range yields no rows.
    pub fn from_port(
        port: &dyn DataPort,
        symbol: &str,
        short_window: usize,
        long_window: usize,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, SmacrossError> {
        validate_window("short_window", short_window)?;
        validate_window("long_window", long_window)?;

        let points = port.fetch_closes(symbol, start, end)?;
        let mut evaluator = Self::new(symbol, points, short_window, long_window)?;
        evaluator.start = start;
        evaluator.end = end;
        Ok(evaluator)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn short_window(&self) -> usize {
        self.short_window
    }

    pub fn long_window(&self) -> usize {
        self.long_window
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn points(&self) -> &[ClosePoint] {
        &self.points
    }

    /// `"{symbol} | SMA_S = {short} | SMA_L = {long}"`, used as report title.
    pub fn describe(&self) -> String {
        format!(
            "{} | SMA_S = {} | SMA_L = {}",
            self.symbol, self.short_window, self.long_window
        )
    }

    /// Result of the most recent [`evaluate`](Self::evaluate), if any.
    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last_evaluation.as_ref()
    }

    /// Full grid of the most recent [`optimize`](Self::optimize) sweep, in
    /// evaluation order.
    pub fn grid_results(&self) -> Option<&[GridPoint]> {
        self.grid.as_deref()
    }

    /// Update one or both window lengths, recomputing only the affected
    /// rolling-mean column. Omitted parameters leave their column untouched.
    pub fn set_parameters(
        &mut self,
        short_window: Option<usize>,
        long_window: Option<usize>,
    ) -> Result<(), SmacrossError> {
        if let Some(short) = short_window {
            validate_window("short_window", short)?;
        }
        if let Some(long) = long_window {
            validate_window("long_window", long)?;
        }

        if let Some(short) = short_window {
            self.short_window = short;
            self.sma_short = rolling_mean(&self.closes, short);
        }
        if let Some(long) = long_window {
            self.long_window = long;
            self.sma_long = rolling_mean(&self.closes, long);
        }
        Ok(())
    }

    /// Evaluate the strategy at the current windows and store the result.
    ///
    /// Returns `(performance, outperformance)` rounded to 6 decimal places.
    pub fn evaluate(&mut self) -> Result<(f64, f64), SmacrossError> {
        let evaluation =
            crossover::evaluate_prepared(&self.points, &self.returns, &self.sma_short, &self.sma_long)
                .ok_or(SmacrossError::NoEvaluableData {
                    short: self.short_window,
                    long: self.long_window,
                    rows: self.points.len(),
                })?;

        let summary = (evaluation.performance, evaluation.outperformance);
        self.last_evaluation = Some(evaluation);
        Ok(summary)
    }

    /// Exhaustively evaluate the Cartesian product of the two ranges (outer
    /// loop short, inner loop long, both ascending) and move the evaluator to
    /// the best pair.
    ///
    /// Candidates are independent of the evaluator's mutable columns, so the
    /// grid is evaluated in parallel against the immutable base series; the
    /// recorded order and the first-wins argmax are unaffected. Any failing
    /// candidate fails the whole sweep. Afterwards the parameters are set to
    /// the optimum and a fresh evaluation is stored for it.
    pub fn optimize(
        &mut self,
        short_range: ParamRange,
        long_range: ParamRange,
    ) -> Result<OptimizationResult, SmacrossError> {
        let pairs: Vec<(usize, usize)> = short_range
            .values()
            .flat_map(|s| long_range.values().map(move |l| (s, l)))
            .collect();
        if pairs.is_empty() {
            return Err(SmacrossError::InvalidParameter {
                reason: "parameter ranges produce an empty grid".into(),
            });
        }

        let performances: Vec<f64> = pairs
            .par_iter()
            .map(|&(short, long)| {
                let sma_short = rolling_mean(&self.closes, short);
                let sma_long = rolling_mean(&self.closes, long);
                crossover::evaluate_prepared(&self.points, &self.returns, &sma_short, &sma_long)
                    .map(|e| e.performance)
                    .ok_or(SmacrossError::NoEvaluableData {
                        short,
                        long,
                        rows: self.points.len(),
                    })
            })
            .collect::<Result<_, _>>()?;

        // stable argmax: strict comparison keeps the earliest maximum
        let mut best = 0;
        for (i, &performance) in performances.iter().enumerate() {
            if performance > performances[best] {
                best = i;
            }
        }
        let (short, long) = pairs[best];

        self.grid = Some(
            pairs
                .iter()
                .zip(&performances)
                .map(|(&(short_window, long_window), &performance)| GridPoint {
                    short_window,
                    long_window,
                    performance,
                })
                .collect(),
        );

        self.set_parameters(Some(short), Some(long))?;
        let (performance, _) = self.evaluate()?;

        Ok(OptimizationResult {
            short_window: short,
            long_window: long,
            performance,
        })
    }
}

fn validate_window(name: &str, window: usize) -> Result<(), SmacrossError> {
    if window == 0 {
        return Err(SmacrossError::InvalidParameter {
            reason: format!("{name} must be positive"),
        });
    }
    Ok(())
}
