//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, one point per input bar
//!
//! Points inside an indicator's warmup are kept (so indices line up with the
//! input bars) but marked invalid; read them through [`IndicatorPoint::value`].

pub mod atr;
pub mod obv;
pub mod slope;

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn value(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Atr(usize),
    Obv,
    Slope(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(IndicatorPoint::value)
    }

    /// Most recent valid value, if any.
    pub fn last_value(&self) -> Option<f64> {
        self.values.iter().rev().find_map(IndicatorPoint::value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Slope(period) => write!(f, "SLOPE({})", period),
        }
    }
}
