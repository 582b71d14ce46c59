#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
pub use renkotrader::domain::config::StrategyConfig;
use renkotrader::domain::error::RenkoError;
pub use renkotrader::domain::ohlcv::Bar;
use renkotrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, RenkoError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RenkoError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, RenkoError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Five-minute bar timestamps starting at 09:30 on 2024-06-10.
pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 10)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
        + chrono::Duration::minutes(5 * i as i64)
}

pub fn make_bar(i: usize, close: f64) -> Bar {
    Bar {
        timestamp: ts(i),
        open: close,
        high: close + 0.2,
        low: close - 0.2,
        close,
        adj_close: close,
        volume: 1_000.0,
    }
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect()
}

pub fn rally(n: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
    bars_from_closes(&closes)
}

/// Closes that reverse by exactly two unit bricks every bar after the first
/// brick, so each bar forms a single brick in the opposite direction.
pub fn zigzag(n: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| match i {
            0 => 100.0,
            i if i % 2 == 1 => 101.0,
            _ => 99.0,
        })
        .collect();
    bars_from_closes(&closes)
}

/// Default strategy with unit bricks; ATR never warms up on short fixtures.
pub fn unit_brick_config() -> StrategyConfig {
    let mut config = StrategyConfig::default();
    config.renko.brick_floor = 1.0;
    config
}
