//! Strategy parameters and their defaults.

use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenkoParams {
    /// ATR look-back used to size bricks.
    pub atr_window: usize,
    /// Smallest permitted brick size.
    pub brick_floor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalParams {
    pub slope_window: usize,
    /// |bar_num| needed to enter or hold a position.
    pub bar_num_threshold: i64,
    /// |OBV slope| in degrees needed to enter a position.
    pub slope_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annualization {
    pub trading_days: u32,
    pub bars_per_day: u32,
}

impl Annualization {
    pub fn bars_per_year(&self) -> f64 {
        self.trading_days as f64 * self.bars_per_day as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyConfig {
    pub renko: RenkoParams,
    pub signal: SignalParams,
    pub annualization: Annualization,
    pub risk_free_rate: f64,
}

impl Default for RenkoParams {
    fn default() -> Self {
        Self {
            atr_window: 120,
            brick_floor: 0.5,
        }
    }
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            slope_window: 5,
            bar_num_threshold: 2,
            slope_threshold: 30.0,
        }
    }
}

impl Default for Annualization {
    /// 252 sessions of 78 five-minute bars.
    fn default() -> Self {
        Self {
            trading_days: 252,
            bars_per_day: 78,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            renko: RenkoParams::default(),
            signal: SignalParams::default(),
            annualization: Annualization::default(),
            risk_free_rate: 0.05,
        }
    }
}

impl StrategyConfig {
    /// Build from a config source, falling back to defaults for absent keys.
    pub fn from_port(config: &dyn ConfigPort) -> Self {
        let d = StrategyConfig::default();
        Self {
            renko: RenkoParams {
                atr_window: config.get_int("renko", "atr_window", d.renko.atr_window as i64).max(0)
                    as usize,
                brick_floor: config.get_double("renko", "brick_floor", d.renko.brick_floor),
            },
            signal: SignalParams {
                slope_window: config
                    .get_int("signal", "slope_window", d.signal.slope_window as i64)
                    .max(0) as usize,
                bar_num_threshold: config.get_int(
                    "signal",
                    "bar_num_threshold",
                    d.signal.bar_num_threshold,
                ),
                slope_threshold: config.get_double(
                    "signal",
                    "slope_threshold",
                    d.signal.slope_threshold,
                ),
            },
            annualization: Annualization {
                trading_days: config
                    .get_int("metrics", "trading_days", d.annualization.trading_days as i64)
                    .clamp(0, u32::MAX as i64) as u32,
                bars_per_day: config
                    .get_int("metrics", "bars_per_day", d.annualization.bars_per_day as i64)
                    .clamp(0, u32::MAX as i64) as u32,
            },
            risk_free_rate: config.get_double("metrics", "risk_free_rate", d.risk_free_rate),
        }
    }
}
