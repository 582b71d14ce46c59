//! Rolling trend slope in degrees.
//!
//! For each window of `n` consecutive values, both the values (y) and the
//! positions 0..n-1 (x) are min-max scaled to [0, 1], an ordinary least
//! squares line y = a + b·x is fitted, and the slope is reported as
//! atan(b) in degrees. A flat window (max == min) has slope 0.
//! Warmup: first (n-1) points are invalid, as is any window that contains
//! an invalid input point.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

/// OLS slope coefficient of min-max scaled `window` against scaled positions.
pub fn scaled_regression_slope(window: &[f64]) -> f64 {
    let n = window.len();
    if n < 2 {
        return 0.0;
    }

    let (min, max) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if range == 0.0 || !range.is_finite() {
        return 0.0;
    }

    let last = (n - 1) as f64;
    let x_mean = 0.5;
    let y_mean = window.iter().map(|v| (v - min) / range).sum::<f64>() / n as f64;

    let mut sxy = 0.0_f64;
    let mut sxx = 0.0_f64;
    for (k, v) in window.iter().enumerate() {
        let dx = k as f64 / last - x_mean;
        let dy = (v - min) / range - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
    }

    sxy / sxx
}

pub fn slope_degrees(window: &[f64]) -> f64 {
    scaled_regression_slope(window).atan().to_degrees()
}

pub fn calculate_slope(input: &IndicatorSeries, period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(input.len());

    for (i, point) in input.values.iter().enumerate() {
        let window = if period >= 2 && i + 1 >= period {
            input.values[i + 1 - period..=i]
                .iter()
                .map(IndicatorPoint::value)
                .collect::<Option<Vec<f64>>>()
        } else {
            None
        };

        values.push(match window {
            Some(w) => IndicatorPoint {
                timestamp: point.timestamp,
                valid: true,
                value: slope_degrees(&w),
            },
            None => IndicatorPoint {
                timestamp: point.timestamp,
                valid: false,
                value: 0.0,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Slope(period),
        values,
    }
}
