//! Merge the sparse Renko run counts back onto the bar timeline.
//!
//! Every bar timestamp is kept. A Renko point lands on the bar that completed
//! its brick and its `bar_num` is carried forward until the next point; bars
//! before the first completed brick have no `bar_num`. OBV and its rolling
//! slope are computed on the merged series.

use crate::domain::error::RenkoError;
use crate::domain::indicator::obv::calculate_obv;
use crate::domain::indicator::slope::calculate_slope;
use crate::domain::ohlcv::Bar;
use crate::domain::renko::RenkoPoint;

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedBar {
    pub bar: Bar,
    pub bar_num: Option<i64>,
    pub obv: f64,
    pub obv_slope: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct AlignedSeries {
    pub rows: Vec<AlignedBar>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Forward-fill `points` across `bars`. Both inputs must be ordered by
/// timestamp and every point must match some bar.
pub fn forward_fill_bar_num(
    bars: &[Bar],
    points: &[RenkoPoint],
) -> Result<Vec<Option<i64>>, RenkoError> {
    let mut filled = Vec::with_capacity(bars.len());
    let mut current: Option<i64> = None;
    let mut next = points.iter().peekable();

    for bar in bars {
        while let Some(point) = next.peek() {
            if point.timestamp < bar.timestamp {
                return Err(RenkoError::Alignment {
                    reason: format!(
                        "renko timestamp {} has no matching bar",
                        point.timestamp
                    ),
                });
            }
            if point.timestamp > bar.timestamp {
                break;
            }
            // later points on the same timestamp win
            current = Some(point.bar_num);
            next.next();
        }
        filled.push(current);
    }

    if let Some(point) = next.next() {
        return Err(RenkoError::Alignment {
            reason: format!(
                "renko timestamp {} is past the last bar",
                point.timestamp
            ),
        });
    }

    Ok(filled)
}

pub fn align(
    bars: &[Bar],
    points: &[RenkoPoint],
    slope_window: usize,
) -> Result<AlignedSeries, RenkoError> {
    let bar_nums = forward_fill_bar_num(bars, points)?;
    let obv = calculate_obv(bars);
    let slope = calculate_slope(&obv, slope_window);

    let rows = bars
        .iter()
        .zip(bar_nums)
        .enumerate()
        .map(|(i, (bar, bar_num))| AlignedBar {
            bar: bar.clone(),
            bar_num,
            obv: obv.values[i].value,
            obv_slope: slope.value_at(i),
        })
        .collect();

    Ok(AlignedSeries { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 4)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
            + chrono::Duration::minutes(5 * i as i64)
    }

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar {
                    timestamp: ts(i),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    adj_close: close,
                    volume: 10.0,
                }
            })
            .collect()
    }

    fn point(i: usize, bar_num: i64) -> RenkoPoint {
        RenkoPoint {
            timestamp: ts(i),
            bar_num,
        }
    }

    #[test]
    fn fills_forward_between_bricks() {
        let filled =
            forward_fill_bar_num(&bars(7), &[point(1, 1), point(4, 2), point(5, -1)]).unwrap();
        assert_eq!(
            filled,
            vec![None, Some(1), Some(1), Some(1), Some(2), Some(-1), Some(-1)]
        );
    }

    #[test]
    fn no_points_leaves_everything_empty() {
        let filled = forward_fill_bar_num(&bars(3), &[]).unwrap();
        assert_eq!(filled, vec![None, None, None]);
    }

    #[test]
    fn unmatched_point_is_an_error() {
        let mut points = vec![point(1, 1)];
        points[0].timestamp += chrono::Duration::minutes(1);
        let err = forward_fill_bar_num(&bars(3), &points).unwrap_err();
        assert!(matches!(err, RenkoError::Alignment { .. }));
    }

    #[test]
    fn point_after_last_bar_is_an_error() {
        let err = forward_fill_bar_num(&bars(3), &[point(5, 1)]).unwrap_err();
        assert!(matches!(err, RenkoError::Alignment { .. }));
    }

    #[test]
    fn align_keeps_every_bar_and_adds_indicators() {
        let series = align(&bars(6), &[point(2, 2)], 5).unwrap();
        assert_eq!(series.len(), 6);
        assert_eq!(series.rows[1].bar_num, None);
        assert_eq!(series.rows[2].bar_num, Some(2));
        assert_eq!(series.rows[5].bar_num, Some(2));
        // rising closes, constant volume: OBV = 0, 10, 20, ...
        assert_eq!(series.rows[3].obv, 30.0);
        assert_eq!(series.rows[3].obv_slope, None);
        let slope = series.rows[4].obv_slope.unwrap();
        assert!((slope - 45.0).abs() < 1e-9);
    }
}
