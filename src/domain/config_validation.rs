//! Configuration validation.
//!
//! Validates all config fields before any data is touched.

use crate::domain::error::SmacrossError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Fields required by `backtest` and `optimize` alike.
pub fn validate_base_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    validate_csv_path(config)?;
    validate_symbol(config)?;
    validate_window(config, "short_window")?;
    validate_window(config, "long_window")?;
    validate_dates(config)?;
    Ok(())
}

/// Additional `[optimize]` fields for the grid sweep.
pub fn validate_optimize_config(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    for key in [
        "short_start",
        "short_stop",
        "short_step",
        "long_start",
        "long_stop",
        "long_step",
    ] {
        validate_grid_value(config, key)?;
    }
    Ok(())
}

fn validate_csv_path(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    match config.get_string("data", "csv_path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SmacrossError::ConfigMissing {
            section: "data".to_string(),
            key: "csv_path".to_string(),
        }),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    match config.get_string("data", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SmacrossError::ConfigMissing {
            section: "data".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_window(config: &dyn ConfigPort, key: &str) -> Result<(), SmacrossError> {
    let value = config.get_int("strategy", key, 0);
    if value <= 0 {
        return Err(SmacrossError::ConfigInvalid {
            section: "strategy".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a positive integer"),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SmacrossError> {
    let start_str = config.get_string("strategy", "start_date");
    let end_str = config.get_string("strategy", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date > end_date {
        return Err(SmacrossError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must not be after end_date".to_string(),
        });
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SmacrossError> {
    match value {
        None => Err(SmacrossError::ConfigMissing {
            section: "strategy".to_string(),
            key: field.to_string(),
        }),
        Some(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| SmacrossError::ConfigInvalid {
                section: "strategy".to_string(),
                key: field.to_string(),
                reason: format!("invalid {field} format, expected YYYY-MM-DD"),
            })
        }
    }
}

fn validate_grid_value(config: &dyn ConfigPort, key: &str) -> Result<(), SmacrossError> {
    let value = config.get_int("optimize", key, 0);
    if value <= 0 {
        return Err(SmacrossError::ConfigInvalid {
            section: "optimize".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be a positive integer"),
        });
    }
    Ok(())
}
