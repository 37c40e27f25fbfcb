//! Pure crossover-strategy evaluation.
//!
//! The position held over bar `i` is the signal at the close of bar `i-1`
//! (long where the short mean sits above the long mean, short otherwise).
//! That one-bar lag models entering at the next bar and is part of the
//! contract; applying the signal to the same bar changes every number.

use chrono::NaiveDate;

use crate::domain::close::ClosePoint;
use crate::domain::error::SmacrossError;
use crate::domain::series::{log_returns, rolling_mean};

/// One surviving row of an evaluation: the position applied over the bar,
/// the bar's market and strategy log returns, and both compounded curves.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRow {
    pub date: NaiveDate,
    pub position: i8,
    pub market_return: f64,
    pub strategy_return: f64,
    pub cum_market: f64,
    pub cum_strategy: f64,
}

/// Result of evaluating one (short, long) window pair.
///
/// `performance` is the final compounded strategy ratio and `outperformance`
/// the margin over buy-and-hold, both rounded to 6 decimal places
/// (1.0 = breakeven).
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub rows: Vec<EvaluationRow>,
    pub performance: f64,
    pub outperformance: f64,
}

pub(crate) fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Evaluate the crossover strategy for `short`/`long` windows over a price
/// series, with no shared state.
pub fn evaluate_crossover(
    points: &[ClosePoint],
    short: usize,
    long: usize,
) -> Result<Evaluation, SmacrossError> {
    if short == 0 || long == 0 {
        return Err(SmacrossError::InvalidParameter {
            reason: format!("window lengths must be positive, got short={short} long={long}"),
        });
    }

    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    let returns = log_returns(&closes);
    let sma_short = rolling_mean(&closes, short);
    let sma_long = rolling_mean(&closes, long);

    evaluate_prepared(points, &returns, &sma_short, &sma_long).ok_or(
        SmacrossError::NoEvaluableData {
            short,
            long,
            rows: points.len(),
        },
    )
}

/// Evaluation over precomputed columns. Returns `None` when no row survives
/// the pruning.
///
/// A row enters the result only if it and its predecessor both carry a
/// defined return and both means: the predecessor supplies the position, and
/// rows lacking any operand are dropped rather than masked.
pub(crate) fn evaluate_prepared(
    points: &[ClosePoint],
    returns: &[Option<f64>],
    sma_short: &[Option<f64>],
    sma_long: &[Option<f64>],
) -> Option<Evaluation> {
    let defined =
        |i: usize| returns[i].is_some() && sma_short[i].is_some() && sma_long[i].is_some();

    let mut rows = Vec::new();
    let mut log_market = 0.0;
    let mut log_strategy = 0.0;

    for i in 1..points.len() {
        if !defined(i) || !defined(i - 1) {
            continue;
        }
        let (Some(market_return), Some(prev_short), Some(prev_long)) =
            (returns[i], sma_short[i - 1], sma_long[i - 1])
        else {
            continue;
        };

        let position: i8 = if prev_short > prev_long { 1 } else { -1 };
        let strategy_return = f64::from(position) * market_return;

        log_market += market_return;
        log_strategy += strategy_return;

        rows.push(EvaluationRow {
            date: points[i].date,
            position,
            market_return,
            strategy_return,
            cum_market: log_market.exp(),
            cum_strategy: log_strategy.exp(),
        });
    }

    if rows.is_empty() {
        return None;
    }

    let performance = round6(log_strategy.exp());
    let outperformance = round6(log_strategy.exp() - log_market.exp());

    Some(Evaluation {
        rows,
        performance,
        outperformance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_points(closes: &[f64]) -> Vec<ClosePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| ClosePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                close,
            })
            .collect()
    }

    // 10 closes, S=2, L=4: the short mean stays above the long mean at every
    // defined signal index, so the strategy is always long and matches
    // buy-and-hold over the surviving rows (indices 4..=9).
    #[test]
    fn always_long_series_matches_market() {
        let points = make_points(&[
            100.0, 102.0, 101.0, 105.0, 110.0, 108.0, 115.0, 120.0, 118.0, 125.0,
        ]);
        let eval = evaluate_crossover(&points, 2, 4).unwrap();

        assert_eq!(eval.rows.len(), 6);
        assert_eq!(
            eval.rows[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(eval.rows.iter().all(|r| r.position == 1));

        // exp(sum of log returns over closes[4..=9] relative to closes[3])
        // collapses to 125/105
        assert!((eval.performance - 1.190476).abs() < 1e-9);
        assert!((eval.outperformance - 0.0).abs() < 1e-9);
    }

    // Downtrending closes keep the strategy short; the final strategy curve
    // is the reciprocal of the market curve.
    #[test]
    fn downtrend_series_held_short() {
        let points = make_points(&[100.0, 95.0, 90.0, 92.0, 88.0, 85.0, 87.0, 84.0]);
        let eval = evaluate_crossover(&points, 2, 3).unwrap();

        // first surviving row: index 3 (row 2 is the first with both means)
        assert_eq!(eval.rows.len(), 5);
        assert_eq!(
            eval.rows[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
        );
        assert!(eval.rows.iter().all(|r| r.position == -1));

        // market: 84/90, strategy: 90/84
        assert!((eval.performance - 1.071429).abs() < 1e-9);
        assert!((eval.outperformance - 0.138095).abs() < 1e-9);
    }

    #[test]
    fn equal_means_signal_short() {
        // constant closes make both means equal everywhere; the tie is never
        // a flat position
        let points = make_points(&[100.0; 8]);
        let eval = evaluate_crossover(&points, 2, 4).unwrap();

        assert!(eval.rows.iter().all(|r| r.position == -1));
        assert!((eval.performance - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn position_lags_signal_by_one_bar() {
        // the signal flips short at index 5; the held position flips one bar
        // later, so the bar-5 drop is still ridden long
        let closes = [100.0, 101.0, 103.0, 106.0, 104.0, 98.0, 96.0, 95.0];
        let points = make_points(&closes);
        let eval = evaluate_crossover(&points, 2, 3).unwrap();

        let positions: Vec<i8> = eval.rows.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 1, 1, -1, -1]);

        for row in &eval.rows {
            assert!(
                (row.strategy_return - f64::from(row.position) * row.market_return).abs()
                    < f64::EPSILON
            );
        }
    }

    #[test]
    fn window_longer_than_series_has_no_rows() {
        let points = make_points(&[100.0, 101.0, 102.0]);
        let err = evaluate_crossover(&points, 2, 10).unwrap_err();
        assert!(matches!(
            err,
            SmacrossError::NoEvaluableData {
                short: 2,
                long: 10,
                rows: 3,
            }
        ));
    }

    #[test]
    fn empty_series_has_no_rows() {
        let err = evaluate_crossover(&[], 2, 4).unwrap_err();
        assert!(matches!(err, SmacrossError::NoEvaluableData { .. }));
    }

    #[test]
    fn zero_window_rejected() {
        let points = make_points(&[100.0, 101.0]);
        let err = evaluate_crossover(&points, 0, 4).unwrap_err();
        assert!(matches!(err, SmacrossError::InvalidParameter { .. }));
    }

    #[test]
    fn first_row_follows_two_stage_prune() {
        // L=4: first defined signal at index 3, first strategy row at index 4
        let points = make_points(&[
            100.0, 102.0, 101.0, 105.0, 110.0, 108.0, 115.0, 120.0, 118.0, 125.0,
        ]);
        let eval = evaluate_crossover(&points, 2, 4).unwrap();
        assert_eq!(eval.rows.len(), points.len() - 4);
    }

    #[test]
    fn cumulative_curves_compound_log_returns() {
        let points = make_points(&[100.0, 104.0, 99.0, 103.0, 108.0, 105.0, 111.0]);
        let eval = evaluate_crossover(&points, 2, 3).unwrap();

        let mut log_m = 0.0;
        let mut log_s = 0.0;
        for row in &eval.rows {
            log_m += row.market_return;
            log_s += row.strategy_return;
            assert!((row.cum_market - log_m.exp()).abs() < 1e-12);
            assert!((row.cum_strategy - log_s.exp()).abs() < 1e-12);
        }
    }

    #[test]
    fn round6_behaviour() {
        assert!((round6(1.1904761904) - 1.190476).abs() < f64::EPSILON);
        assert!((round6(1.0714285714) - 1.071429).abs() < f64::EPSILON);
        assert!((round6(-0.0000004) - 0.0).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn positions_are_long_or_short(
            closes in prop::collection::vec(1.0f64..500.0, 8..80),
            short in 1usize..5,
            long in 2usize..7,
        ) {
            let points = make_points(&closes);
            let eval = evaluate_crossover(&points, short, long).unwrap();
            prop_assert!(eval
                .rows
                .iter()
                .all(|r| r.position == 1 || r.position == -1));
        }

        #[test]
        fn surviving_row_count_matches_warmup(
            closes in prop::collection::vec(1.0f64..500.0, 8..80),
            short in 1usize..5,
            long in 2usize..7,
        ) {
            let points = make_points(&closes);
            let eval = evaluate_crossover(&points, short, long).unwrap();
            let first = short.max(long).max(2) - 1;
            prop_assert_eq!(eval.rows.len(), closes.len() - first - 1);
        }
    }
}
