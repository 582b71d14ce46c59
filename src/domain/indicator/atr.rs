//! ATR (Average True Range) indicator.
//!
//! TR[0] = high[0] - low[0]
//! TR[i] = max(high - low, |high - adj_close[i-1]|, |low - adj_close[i-1]|)
//! ATR(n)[i] = mean(TR[i-n+1..=i])
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Bar;

pub fn true_range_series(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].adj_close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    let tr = true_range_series(bars);
    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0_f64;

    for (i, bar) in bars.iter().enumerate() {
        window_sum += tr[i];
        if period > 0 && i >= period {
            window_sum -= tr[i - period];
        }

        let valid = period > 0 && i + 1 >= period;
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: if valid { window_sum / period as f64 } else { 0.0 },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
