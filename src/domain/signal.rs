//! Per-bar position state machine.
//!
//! Each bar first emits a return for the position held coming into it, then
//! evaluates transitions from that bar's `bar_num` and OBV slope:
//!
//! | from  | to    | when                                              |
//! |-------|-------|---------------------------------------------------|
//! | Flat  | Long  | bar_num >= T and slope > S                        |
//! | Flat  | Short | bar_num <= -T and slope < -S                      |
//! | Long  | Short | bar_num <= -T and slope < -S                      |
//! | Long  | Flat  | bar_num < T (short condition not met)             |
//! | Short | Long  | bar_num >= T and slope > S                        |
//! | Short | Flat  | bar_num > -T (long condition not met)             |
//!
//! A missing `bar_num` or slope never satisfies a condition, so the state is
//! held. Short positions book the raw close-to-close change, the same as
//! longs.

use crate::domain::aligner::{AlignedBar, AlignedSeries};
use crate::domain::config::SignalParams;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
    Short,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "FLAT"),
            PositionState::Long => write!(f, "LONG"),
            PositionState::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalMachine {
    params: SignalParams,
    state: PositionState,
}

impl SignalMachine {
    pub fn new(params: SignalParams) -> Self {
        Self {
            params,
            state: PositionState::Flat,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    fn long_signal(&self, row: &AlignedBar) -> bool {
        matches!(
            (row.bar_num, row.obv_slope),
            (Some(n), Some(s)) if n >= self.params.bar_num_threshold && s > self.params.slope_threshold
        )
    }

    fn short_signal(&self, row: &AlignedBar) -> bool {
        matches!(
            (row.bar_num, row.obv_slope),
            (Some(n), Some(s)) if n <= -self.params.bar_num_threshold && s < -self.params.slope_threshold
        )
    }

    fn next_state(&self, row: &AlignedBar) -> PositionState {
        let threshold = self.params.bar_num_threshold;
        match self.state {
            PositionState::Flat if self.long_signal(row) => PositionState::Long,
            PositionState::Flat if self.short_signal(row) => PositionState::Short,
            PositionState::Long if self.short_signal(row) => PositionState::Short,
            PositionState::Long if row.bar_num.is_some_and(|n| n < threshold) => {
                PositionState::Flat
            }
            PositionState::Short if self.long_signal(row) => PositionState::Long,
            PositionState::Short if row.bar_num.is_some_and(|n| n > -threshold) => {
                PositionState::Flat
            }
            state => state,
        }
    }

    /// Emit the return for `row` under the current state, then transition.
    pub fn step(&mut self, row: &AlignedBar, prev_close: Option<f64>) -> f64 {
        let ret = match (self.state, prev_close) {
            (PositionState::Flat, _) | (_, None) => 0.0,
            (_, Some(prev)) => row.bar.close / prev - 1.0,
        };
        self.state = self.next_state(row);
        ret
    }
}

#[derive(Debug, Clone)]
pub struct SignalRun {
    /// State held coming into each bar, i.e. the one its return belongs to.
    pub states: Vec<PositionState>,
    pub returns: Vec<f64>,
    /// Entries from Flat plus direct reversals.
    pub position_changes: usize,
    pub final_state: PositionState,
}

pub fn run_signals(series: &AlignedSeries, params: SignalParams) -> SignalRun {
    let mut machine = SignalMachine::new(params);
    let mut states = Vec::with_capacity(series.len());
    let mut returns = Vec::with_capacity(series.len());
    let mut position_changes = 0usize;

    for (i, row) in series.rows.iter().enumerate() {
        let held = machine.state();
        let prev_close = i.checked_sub(1).map(|p| series.rows[p].bar.close);
        states.push(held);
        returns.push(machine.step(row, prev_close));

        let now = machine.state();
        if now != held && now != PositionState::Flat {
            position_changes += 1;
        }
    }

    SignalRun {
        states,
        returns,
        position_changes,
        final_state: machine.state(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::Bar;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 5)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
            + chrono::Duration::minutes(5 * i as i64)
    }

    fn row(i: usize, close: f64, bar_num: Option<i64>, slope: Option<f64>) -> AlignedBar {
        AlignedBar {
            bar: Bar {
                timestamp: ts(i),
                open: close,
                high: close,
                low: close,
                close,
                adj_close: close,
                volume: 1.0,
            },
            bar_num,
            obv: 0.0,
            obv_slope: slope,
        }
    }

    fn series(rows: Vec<(f64, Option<i64>, Option<f64>)>) -> AlignedSeries {
        AlignedSeries {
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, (c, n, s))| row(i, c, n, s))
                .collect(),
        }
    }

    fn machine_in(state: PositionState) -> SignalMachine {
        SignalMachine {
            params: SignalParams::default(),
            state,
        }
    }

    #[test]
    fn flat_enters_long() {
        let mut m = machine_in(PositionState::Flat);
        m.step(&row(0, 100.0, Some(2), Some(31.0)), None);
        assert_eq!(m.state(), PositionState::Long);
    }

    #[test]
    fn flat_enters_short() {
        let mut m = machine_in(PositionState::Flat);
        m.step(&row(0, 100.0, Some(-3), Some(-45.0)), None);
        assert_eq!(m.state(), PositionState::Short);
    }

    #[test]
    fn slope_at_threshold_does_not_enter() {
        let mut m = machine_in(PositionState::Flat);
        m.step(&row(0, 100.0, Some(5), Some(30.0)), None);
        assert_eq!(m.state(), PositionState::Flat);
    }

    #[test]
    fn long_reverses_to_short() {
        let mut m = machine_in(PositionState::Long);
        m.step(&row(1, 100.0, Some(-2), Some(-40.0)), Some(100.0));
        assert_eq!(m.state(), PositionState::Short);
    }

    #[test]
    fn long_exits_when_run_weakens() {
        let mut m = machine_in(PositionState::Long);
        m.step(&row(1, 100.0, Some(1), Some(80.0)), Some(100.0));
        assert_eq!(m.state(), PositionState::Flat);
    }

    #[test]
    fn long_holds_while_run_persists() {
        let mut m = machine_in(PositionState::Long);
        m.step(&row(1, 100.0, Some(4), Some(-80.0)), Some(100.0));
        assert_eq!(m.state(), PositionState::Long);
    }

    #[test]
    fn short_reverses_to_long() {
        let mut m = machine_in(PositionState::Short);
        m.step(&row(1, 100.0, Some(3), Some(60.0)), Some(100.0));
        assert_eq!(m.state(), PositionState::Long);
    }

    #[test]
    fn short_exits_when_run_weakens() {
        let mut m = machine_in(PositionState::Short);
        m.step(&row(1, 100.0, Some(-1), Some(-60.0)), Some(100.0));
        assert_eq!(m.state(), PositionState::Flat);
    }

    #[test]
    fn missing_values_hold_state() {
        for state in [PositionState::Flat, PositionState::Long, PositionState::Short] {
            let mut m = machine_in(state);
            m.step(&row(1, 100.0, None, Some(80.0)), Some(100.0));
            assert_eq!(m.state(), state);
            m.step(&row(2, 100.0, Some(5), None), Some(100.0));
            if state == PositionState::Short {
                // bar_num 5 > -2 closes the short even without a slope
                assert_eq!(m.state(), PositionState::Flat);
            } else {
                assert_eq!(m.state(), state);
            }
        }
    }

    #[test]
    fn return_uses_state_held_into_the_bar() {
        let run = run_signals(
            &series(vec![
                (100.0, Some(2), Some(40.0)), // enters long after emitting 0
                (110.0, Some(3), Some(40.0)), // long: +10%
                (99.0, Some(1), Some(0.0)),   // long: -10%, then exits
                (120.0, Some(1), Some(0.0)),  // flat: 0
            ]),
            SignalParams::default(),
        );
        assert_eq!(
            run.states,
            vec![
                PositionState::Flat,
                PositionState::Long,
                PositionState::Long,
                PositionState::Flat
            ]
        );
        assert_eq!(run.returns.len(), 4);
        assert_eq!(run.returns[0], 0.0);
        assert!((run.returns[1] - 0.10).abs() < 1e-12);
        assert!((run.returns[2] - (-0.10)).abs() < 1e-12);
        assert_eq!(run.returns[3], 0.0);
        assert_eq!(run.position_changes, 1);
        assert_eq!(run.final_state, PositionState::Flat);
    }

    #[test]
    fn short_books_raw_price_change() {
        let run = run_signals(
            &series(vec![
                (100.0, Some(-2), Some(-40.0)),
                (90.0, Some(-3), Some(-40.0)),
            ]),
            SignalParams::default(),
        );
        assert_eq!(run.states[1], PositionState::Short);
        assert!((run.returns[1] - (-0.10)).abs() < 1e-12);
    }

    #[test]
    fn reversal_counts_as_position_change() {
        let run = run_signals(
            &series(vec![
                (100.0, Some(2), Some(40.0)),
                (101.0, Some(-2), Some(-40.0)),
                (102.0, Some(-3), Some(-40.0)),
            ]),
            SignalParams::default(),
        );
        assert_eq!(run.position_changes, 2);
        assert_eq!(run.final_state, PositionState::Short);
    }

    #[test]
    fn empty_series_gives_empty_run() {
        let run = run_signals(&AlignedSeries { rows: vec![] }, SignalParams::default());
        assert!(run.returns.is_empty());
        assert_eq!(run.final_state, PositionState::Flat);
    }
}
