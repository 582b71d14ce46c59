//! Per-instrument backtest pipeline and the batch runner.
//!
//! bars → Renko → aligned series (bar_num, OBV, slope) → signal walk → KPI.
//! Each stage returns a new value; nothing is shared between instruments.

use crate::domain::aligner::{align, AlignedSeries};
use crate::domain::config::StrategyConfig;
use crate::domain::error::RenkoError;
use crate::domain::metrics::Kpi;
use crate::domain::ohlcv::{clean_bars, validate_bars, Bar};
use crate::domain::renko::{build_renko, RenkoSeries};
use crate::domain::signal::{run_signals, SignalRun};
use crate::ports::data_port::DataPort;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct InstrumentReport {
    pub symbol: String,
    pub renko: RenkoSeries,
    pub aligned: AlignedSeries,
    pub run: SignalRun,
    pub kpi: Kpi,
}

impl InstrumentReport {
    pub fn summary(&self) -> InstrumentSummary {
        InstrumentSummary {
            bars: self.aligned.len(),
            bricks: self.renko.bricks.len(),
            brick_size: self.renko.brick_size,
            position_changes: self.run.position_changes,
            kpi: self.kpi,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSummary {
    pub bars: usize,
    pub bricks: usize,
    pub brick_size: f64,
    pub position_changes: usize,
    pub kpi: Kpi,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstrumentOutcome {
    Completed(InstrumentSummary),
    Unavailable { reason: String },
}

impl InstrumentOutcome {
    pub fn kpi(&self) -> Option<&Kpi> {
        match self {
            InstrumentOutcome::Completed(summary) => Some(&summary.kpi),
            InstrumentOutcome::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: BTreeMap<String, InstrumentOutcome>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, InstrumentOutcome::Completed(_)))
            .count()
    }

    pub fn unavailable(&self) -> usize {
        self.outcomes.len() - self.completed()
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentPipeline {
    symbol: String,
    config: StrategyConfig,
}

impl InstrumentPipeline {
    pub fn new(symbol: impl Into<String>, config: StrategyConfig) -> Self {
        Self {
            symbol: symbol.into(),
            config,
        }
    }

    /// Run the full pipeline over a clean bar series.
    pub fn run(&self, bars: &[Bar]) -> Result<InstrumentReport, RenkoError> {
        validate_bars(bars)?;

        let renko = build_renko(bars, &self.config.renko)?;
        let aligned = align(bars, &renko.points, self.config.signal.slope_window)?;
        let run = run_signals(&aligned, self.config.signal);
        let kpi = Kpi::compute(
            &run.returns,
            &self.config.annualization,
            self.config.risk_free_rate,
        );

        tracing::info!(
            symbol = %self.symbol,
            bars = aligned.len(),
            bricks = renko.bricks.len(),
            brick_size = renko.brick_size,
            position_changes = run.position_changes,
            "backtest complete"
        );

        Ok(InstrumentReport {
            symbol: self.symbol.clone(),
            renko,
            aligned,
            run,
            kpi,
        })
    }
}

/// Fetch and clean one instrument's bars.
pub fn load_bars(data_port: &dyn DataPort, symbol: &str) -> Result<Vec<Bar>, RenkoError> {
    let raw = data_port.fetch_bars(symbol)?;
    if raw.is_empty() {
        return Err(RenkoError::NoData {
            symbol: symbol.to_string(),
        });
    }
    let cleaned = clean_bars(raw);
    if cleaned.bars.is_empty() {
        return Err(RenkoError::NoData {
            symbol: symbol.to_string(),
        });
    }
    Ok(cleaned.bars)
}

/// Run every symbol independently; one instrument failing never stops the
/// others.
pub fn run_batch(
    data_port: &dyn DataPort,
    symbols: &[String],
    config: &StrategyConfig,
) -> BatchReport {
    let mut report = BatchReport::default();

    for symbol in symbols {
        tracing::info!(symbol = %symbol, "processing");
        let pipeline = InstrumentPipeline::new(symbol.clone(), *config);
        let outcome = load_bars(data_port, symbol)
            .and_then(|bars| pipeline.run(&bars))
            .map(|r| InstrumentOutcome::Completed(r.summary()))
            .unwrap_or_else(|e| {
                tracing::warn!(symbol = %symbol, error = %e, "instrument unavailable");
                InstrumentOutcome::Unavailable {
                    reason: e.to_string(),
                }
            });
        report.outcomes.insert(symbol.clone(), outcome);
    }

    report
}
