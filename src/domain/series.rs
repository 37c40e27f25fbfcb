//! Derived column calculations over a closing-price series.
//!
//! Columns with a warmup prefix are `Vec<Option<f64>>`; `None` marks an
//! undefined entry.

/// Log return per index: `ln(close[i] / close[i-1])`. Index 0 is undefined.
pub fn log_returns(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    for i in 1..closes.len() {
        out[i] = Some((closes[i] / closes[i - 1]).ln());
    }
    out
}

/// Trailing arithmetic mean over `window` values.
///
/// Undefined for indices below `window - 1`. A zero window or a window longer
/// than the series yields an all-undefined column.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    for i in (window - 1)..values.len() {
        let sum: f64 = values[i + 1 - window..=i].iter().sum();
        out[i] = Some(sum / window as f64);
    }
    out
}
