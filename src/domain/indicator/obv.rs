//! OBV (On-Balance Volume) indicator implementation.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Bar;

/// Direction of bar `i` from the percentage change in adjusted close.
///
/// +1 when the change is >= 0, -1 when negative, 0 for the first bar and
/// whenever the change is undefined (previous adjusted close of zero).
fn direction(bars: &[Bar], i: usize) -> f64 {
    if i == 0 {
        return 0.0;
    }
    let prev = bars[i - 1].adj_close;
    let pct_change = bars[i].adj_close / prev - 1.0;
    if !pct_change.is_finite() {
        0.0
    } else if pct_change >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Calculate OBV over the adjusted close.
///
/// OBV[0] = 0
/// OBV[i] = OBV[i-1] + volume[i] * direction[i]
///
/// No warmup period; all bars are valid.
pub fn calculate_obv(bars: &[Bar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut obv = 0.0_f64;

    for (i, bar) in bars.iter().enumerate() {
        obv += bar.volume * direction(bars, i);
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: obv,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Obv,
        values,
    }
}
