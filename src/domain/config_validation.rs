//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::error::RenkoError;
use crate::ports::config_port::ConfigPort;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), RenkoError> {
    require_non_empty(config, "data", "directory")?;
    require_non_empty(config, "data", "symbols")?;
    Ok(())
}

const INTEGER_KEYS: [(&str, &str); 5] = [
    ("renko", "atr_window"),
    ("signal", "slope_window"),
    ("signal", "bar_num_threshold"),
    ("metrics", "trading_days"),
    ("metrics", "bars_per_day"),
];

const NUMBER_KEYS: [(&str, &str); 3] = [
    ("renko", "brick_floor"),
    ("signal", "slope_threshold"),
    ("metrics", "risk_free_rate"),
];

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RenkoError> {
    for (section, key) in INTEGER_KEYS {
        require_parse::<i64>(config, section, key, "must be an integer")?;
    }
    for (section, key) in NUMBER_KEYS {
        require_parse::<f64>(config, section, key, "must be a number")?;
    }
    validate_atr_window(config)?;
    validate_brick_floor(config)?;
    validate_slope_window(config)?;
    validate_bar_num_threshold(config)?;
    validate_slope_threshold(config)?;
    validate_annualization(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> RenkoError {
    RenkoError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn require_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), RenkoError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(RenkoError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

/// A present value must parse; the numeric getters would otherwise fall back
/// to the default and hide the typo.
fn require_parse<T: std::str::FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<(), RenkoError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<T>().is_err() => Err(invalid(
            section,
            key,
            &format!("{} (got {:?})", reason, raw.trim()),
        )),
        _ => Ok(()),
    }
}

fn validate_atr_window(config: &dyn ConfigPort) -> Result<(), RenkoError> {
    if config.get_int("renko", "atr_window", 120) < 1 {
        return Err(invalid("renko", "atr_window", "atr_window must be at least 1"));
    }
    Ok(())
}

fn validate_brick_floor(config: &dyn ConfigPort) -> Result<(), RenkoError> {
    let value = config.get_double("renko", "brick_floor", 0.5);
    if !(value > 0.0) || !value.is_finite() {
        return Err(invalid("renko", "brick_floor", "brick_floor must be positive"));
    }
    Ok(())
}

fn validate_slope_window(config: &dyn ConfigPort) -> Result<(), RenkoError> {
    if config.get_int("signal", "slope_window", 5) < 2 {
        return Err(invalid(
            "signal",
            "slope_window",
            "slope_window must be at least 2",
        ));
    }
    Ok(())
}

fn validate_bar_num_threshold(config: &dyn ConfigPort) -> Result<(), RenkoError> {
    if config.get_int("signal", "bar_num_threshold", 2) < 1 {
        return Err(invalid(
            "signal",
            "bar_num_threshold",
            "bar_num_threshold must be at least 1",
        ));
    }
    Ok(())
}

fn validate_slope_threshold(config: &dyn ConfigPort) -> Result<(), RenkoError> {
    let value = config.get_double("signal", "slope_threshold", 30.0);
    if !(0.0..90.0).contains(&value) {
        return Err(invalid(
            "signal",
            "slope_threshold",
            "slope_threshold must be between 0 and 90 degrees",
        ));
    }
    Ok(())
}

fn validate_annualization(config: &dyn ConfigPort) -> Result<(), RenkoError> {
    if config.get_int("metrics", "trading_days", 252) < 1 {
        return Err(invalid(
            "metrics",
            "trading_days",
            "trading_days must be at least 1",
        ));
    }
    if config.get_int("metrics", "bars_per_day", 78) < 1 {
        return Err(invalid(
            "metrics",
            "bars_per_day",
            "bars_per_day must be at least 1",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), RenkoError> {
    let value = config.get_double("metrics", "risk_free_rate", 0.05);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "metrics",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}
