//! Renko brick construction and run-length counting.
//!
//! Bricks follow the classic period-close rules. The chart starts from an
//! anchor level `floor(close[0] / size) * size` with an upward bias. For each
//! bar, `moves = trunc((close - last_brick_close) / size)`:
//! - continuing the current direction needs `|moves| >= 1` and forms `|moves|`
//!   bricks;
//! - reversing needs `|moves| >= 2` and forms `|moves| - 1` bricks, the first
//!   one opening a full brick beyond the last close.
//!
//! Every brick is stamped with the timestamp of the bar that completed it, so
//! one fast bar may complete several bricks sharing a timestamp. A single bar
//! may complete at most [`MAX_BRICKS_PER_BAR`] bricks; a bigger jump is
//! treated as a bad tick and rejected.
//!
//! The anchor level is not emitted as a brick, so the first completed up
//! brick has `bar_num` 1. Renko tools that emit the anchor row as an up brick
//! count one higher, which makes entries here fire one brick later.

use crate::domain::config::RenkoParams;
use crate::domain::error::RenkoError;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDateTime;

pub const MAX_BRICKS_PER_BAR: i64 = 1_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub uptrend: bool,
}

/// One de-duplicated Renko observation: the run count as of `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenkoPoint {
    pub timestamp: NaiveDateTime,
    pub bar_num: i64,
}

#[derive(Debug, Clone)]
pub struct RenkoSeries {
    pub brick_size: f64,
    pub bricks: Vec<Brick>,
    pub points: Vec<RenkoPoint>,
}

/// max(floor, round(ATR(window).last)). Falls back to the floor when the ATR
/// has no value yet. Rounds half to even.
pub fn brick_size(bars: &[Bar], params: &RenkoParams) -> f64 {
    match calculate_atr(bars, params.atr_window).last_value() {
        Some(atr) => params.brick_floor.max(atr.round_ties_even()),
        None => params.brick_floor,
    }
}

pub fn build_bricks(bars: &[Bar], size: f64) -> Result<Vec<Brick>, RenkoError> {
    let mut bricks = Vec::new();
    let Some(first) = bars.first() else {
        return Ok(bricks);
    };
    if !(size > 0.0) || !size.is_finite() {
        return Err(RenkoError::invalid_input(format!(
            "brick size must be positive, got {}",
            size
        )));
    }

    let mut last_close = (first.close / size).floor() * size;
    if !last_close.is_finite() {
        return Err(RenkoError::invalid_input(format!(
            "close {} is not representable in bricks of {}",
            first.close, size
        )));
    }
    let mut uptrend = true;
    let mut pending_volume = 0.0_f64;

    for bar in bars {
        pending_volume += bar.volume;
        let raw_moves = ((bar.close - last_close) / size).trunc();
        if !(raw_moves.abs() <= MAX_BRICKS_PER_BAR as f64) {
            return Err(RenkoError::invalid_input(format!(
                "bar at {} moves {} bricks of {} (limit {})",
                bar.timestamp, raw_moves, size, MAX_BRICKS_PER_BAR
            )));
        }
        let moves = raw_moves as i64;

        let (count, direction, start) = if uptrend && moves >= 1 {
            (moves, true, last_close)
        } else if uptrend && moves <= -2 {
            (-moves - 1, false, last_close - size)
        } else if !uptrend && moves <= -1 {
            (-moves, false, last_close)
        } else if !uptrend && moves >= 2 {
            (moves - 1, true, last_close + size)
        } else {
            continue;
        };

        let share = pending_volume / count as f64;
        let mut level = start;
        for _ in 0..count {
            let next = if direction { level + size } else { level - size };
            bricks.push(Brick {
                timestamp: bar.timestamp,
                open: level,
                high: level.max(next),
                low: level.min(next),
                close: next,
                volume: share,
                uptrend: direction,
            });
            level = next;
        }

        last_close = level;
        uptrend = direction;
        pending_volume = 0.0;
    }

    Ok(bricks)
}

/// Signed run length: +k after k consecutive up bricks, -k after k down.
pub fn assign_bar_num(bricks: &[Brick]) -> Vec<i64> {
    let mut out = Vec::with_capacity(bricks.len());
    let mut prev = 0_i64;
    for brick in bricks {
        let step = if brick.uptrend { 1 } else { -1 };
        let current = if prev.signum() == step { prev + step } else { step };
        out.push(current);
        prev = current;
    }
    out
}

/// Collapse bricks sharing a completion timestamp, keeping the last.
pub fn dedup_points(bricks: &[Brick], bar_nums: &[i64]) -> Vec<RenkoPoint> {
    let mut points: Vec<RenkoPoint> = Vec::with_capacity(bricks.len());
    for (brick, &bar_num) in bricks.iter().zip(bar_nums) {
        let point = RenkoPoint {
            timestamp: brick.timestamp,
            bar_num,
        };
        match points.last_mut() {
            Some(last) if last.timestamp == point.timestamp => *last = point,
            _ => points.push(point),
        }
    }
    points
}

pub fn build_renko(bars: &[Bar], params: &RenkoParams) -> Result<RenkoSeries, RenkoError> {
    let size = brick_size(bars, params);
    let bricks = build_bricks(bars, size)?;
    let bar_nums = assign_bar_num(&bricks);
    let points = dedup_points(&bricks, &bar_nums);

    tracing::debug!(
        brick_size = size,
        bricks = bricks.len(),
        points = points.len(),
        "built renko series"
    );

    Ok(RenkoSeries {
        brick_size: size,
        bricks,
        points,
    })
}
