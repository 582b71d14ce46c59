//! Performance metrics over a per-bar return series.
//!
//! A metric whose computation would divide by zero or leave the reals is
//! reported as `None` rather than NaN or infinity.

use crate::domain::config::Annualization;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpi {
    pub total_return: Option<f64>,
    pub cagr: Option<f64>,
    pub volatility: Option<f64>,
    pub sharpe: Option<f64>,
    pub max_drawdown: Option<f64>,
}

impl Kpi {
    pub fn compute(returns: &[f64], annualization: &Annualization, risk_free_rate: f64) -> Self {
        let cagr = cagr(returns, annualization);
        let volatility = volatility(returns, annualization);
        Kpi {
            total_return: total_return(returns),
            cagr,
            volatility,
            sharpe: sharpe(cagr, volatility, risk_free_rate),
            max_drawdown: max_drawdown(returns),
        }
    }
}

/// Formats an optional metric, `n/a` when undefined. Width right-aligns.
pub struct MetricDisplay(pub Option<f64>);

impl fmt::Display for MetricDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match (self.0, f.precision()) {
            (Some(v), Some(p)) => format!("{:.*}", p, v),
            (Some(v), None) => v.to_string(),
            (None, _) => "n/a".to_string(),
        };
        match f.width() {
            Some(w) => write!(f, "{:>w$}", text),
            None => f.write_str(&text),
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Running product of (1 + r).
pub fn cumulative_growth(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0_f64, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect()
}

pub fn total_return(returns: &[f64]) -> Option<f64> {
    cumulative_growth(returns).last().and_then(|g| finite(g - 1.0))
}

/// growth^(1 / years) - 1 with years = bars / bars_per_year.
pub fn cagr(returns: &[f64], annualization: &Annualization) -> Option<f64> {
    let growth = *cumulative_growth(returns).last()?;
    let bars_per_year = annualization.bars_per_year();
    if bars_per_year <= 0.0 || growth < 0.0 {
        return None;
    }
    let years = returns.len() as f64 / bars_per_year;
    finite(growth.powf(1.0 / years) - 1.0)
}

/// Sample standard deviation of per-bar returns, annualized.
pub fn volatility(returns: &[f64], annualization: &Annualization) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    finite(variance.sqrt() * annualization.bars_per_year().sqrt())
}

pub fn sharpe(cagr: Option<f64>, volatility: Option<f64>, risk_free_rate: f64) -> Option<f64> {
    match (cagr, volatility) {
        (Some(c), Some(v)) if v > 0.0 => finite((c - risk_free_rate) / v),
        _ => None,
    }
}

/// Largest (running_peak - growth) / running_peak over the growth curve.
pub fn max_drawdown(returns: &[f64]) -> Option<f64> {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd: Option<f64> = None;

    for growth in cumulative_growth(returns) {
        peak = peak.max(growth);
        if peak <= 0.0 {
            return None;
        }
        let dd = (peak - growth) / peak;
        max_dd = Some(max_dd.map_or(dd, |m| m.max(dd)));
    }

    max_dd.and_then(finite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn intraday() -> Annualization {
        Annualization::default()
    }

    #[test]
    fn cumulative_growth_compounds() {
        let g = cumulative_growth(&[0.1, -0.5, 1.0]);
        assert_relative_eq!(g[0], 1.1, epsilon = 1e-12);
        assert_relative_eq!(g[1], 0.55, epsilon = 1e-12);
        assert_relative_eq!(g[2], 1.1, epsilon = 1e-12);
    }

    #[test]
    fn total_return_of_empty_is_undefined() {
        assert_eq!(total_return(&[]), None);
        assert_eq!(cagr(&[], &intraday()), None);
    }

    #[test]
    fn cagr_constant_return() {
        let r = 0.0001;
        let n = 1000;
        let returns = vec![r; n];
        // growth (1+r)^n over n / 19_656 years
        let expected = (1.0_f64 + r).powf(19_656.0) - 1.0;
        assert_relative_eq!(cagr(&returns, &intraday()).unwrap(), expected, max_relative = 1e-9);
    }

    #[test]
    fn cagr_full_year_equals_total_return() {
        let ann = Annualization {
            trading_days: 2,
            bars_per_day: 2,
        };
        let returns = [0.1, 0.0, -0.05, 0.02];
        assert_relative_eq!(
            cagr(&returns, &ann).unwrap(),
            total_return(&returns).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn volatility_needs_two_returns() {
        assert_eq!(volatility(&[0.01], &intraday()), None);
    }

    #[test]
    fn volatility_sample_stddev() {
        let ann = Annualization {
            trading_days: 1,
            bars_per_day: 4,
        };
        // mean 0.02, deviations ±0.01 → sample var = 4e-4/3
        let returns = [0.01, 0.03, 0.01, 0.03];
        let expected = (4e-4_f64 / 3.0).sqrt() * 2.0;
        assert_relative_eq!(volatility(&returns, &ann).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn sharpe_undefined_for_zero_volatility() {
        let returns = vec![0.0; 50];
        let kpi = Kpi::compute(&returns, &intraday(), 0.05);
        assert_eq!(kpi.cagr, Some(0.0));
        assert_eq!(kpi.volatility, Some(0.0));
        assert_eq!(kpi.sharpe, None);
        assert_eq!(kpi.max_drawdown, Some(0.0));
    }

    #[test]
    fn sharpe_is_excess_cagr_over_volatility() {
        assert_relative_eq!(sharpe(Some(0.25), Some(0.5), 0.05).unwrap(), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown_uses_running_peak() {
        // growth: 1.1, 0.88, 0.968, 1.21
        let returns = [0.1, -0.2, 0.1, 0.25];
        assert_relative_eq!(max_drawdown(&returns).unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown_zero_for_rising_curve() {
        assert_eq!(max_drawdown(&[0.01, 0.02, 0.0, 0.03]), Some(0.0));
    }

    #[test]
    fn max_drawdown_undefined_after_total_loss() {
        assert_eq!(max_drawdown(&[-1.0, 0.0]), None);
    }

    #[test]
    fn metric_display() {
        assert_eq!(format!("{:.2}", MetricDisplay(Some(0.12345))), "0.12");
        assert_eq!(format!("{:.2}", MetricDisplay(None)), "n/a");
        assert_eq!(format!("{:>6.1}", MetricDisplay(Some(2.0))), "   2.0");
    }
}
