//! OHLCV bar representation, cleaning and validation.

use crate::domain::error::RenkoError;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, |high - prev_adj_close|, |low - prev_adj_close|)
    pub fn true_range(&self, prev_adj_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_adj_close).abs();
        let lc = (self.low - prev_adj_close).abs();
        hl.max(hc).max(lc)
    }

    /// True when every price and volume field holds a finite number.
    pub fn is_complete(&self) -> bool {
        [
            self.open,
            self.high,
            self.low,
            self.close,
            self.adj_close,
            self.volume,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Result of [`clean_bars`]: the usable bars plus what was thrown away.
#[derive(Debug, Clone)]
pub struct CleanedBars {
    pub bars: Vec<Bar>,
    pub dropped_incomplete: usize,
    pub dropped_duplicates: usize,
}

/// Drop incomplete rows, sort by timestamp and collapse duplicate timestamps
/// (last row wins).
pub fn clean_bars(raw: Vec<Bar>) -> CleanedBars {
    let before = raw.len();
    let mut bars: Vec<Bar> = raw.into_iter().filter(Bar::is_complete).collect();
    let dropped_incomplete = before - bars.len();

    // stable sort keeps feed order among equal timestamps
    bars.sort_by_key(|b| b.timestamp);

    let complete = bars.len();
    let mut deduped: Vec<Bar> = Vec::with_capacity(complete);
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => deduped.push(bar),
        }
    }
    let dropped_duplicates = complete - deduped.len();

    if dropped_incomplete > 0 || dropped_duplicates > 0 {
        tracing::warn!(
            dropped_incomplete,
            dropped_duplicates,
            "dropped bars during cleaning"
        );
    }

    CleanedBars {
        bars: deduped,
        dropped_incomplete,
        dropped_duplicates,
    }
}

/// Gate for the core pipeline: non-empty, complete, strictly increasing.
pub fn validate_bars(bars: &[Bar]) -> Result<(), RenkoError> {
    if bars.is_empty() {
        return Err(RenkoError::invalid_input("bar series is empty"));
    }
    for (i, bar) in bars.iter().enumerate() {
        if !bar.is_complete() {
            return Err(RenkoError::invalid_input(format!(
                "bar {} at {} has a missing OHLCV field",
                i, bar.timestamp
            )));
        }
        if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
            return Err(RenkoError::invalid_input(format!(
                "timestamps not strictly increasing at bar {} ({})",
                i, bar.timestamp
            )));
        }
    }
    Ok(())
}
