//! CSV KPI report adapter implementing ReportPort.

use crate::domain::error::RenkoError;
use crate::domain::pipeline::{BatchReport, InstrumentOutcome};
use crate::ports::report_port::ReportPort;

const HEADER: [&str; 12] = [
    "symbol",
    "status",
    "bars",
    "bricks",
    "brick_size",
    "position_changes",
    "total_return",
    "cagr",
    "volatility",
    "sharpe",
    "max_drawdown",
    "reason",
];

pub struct CsvReportAdapter;

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

/// One CSV row per instrument; undefined metrics are left blank.
pub fn report_rows(report: &BatchReport) -> Vec<Vec<String>> {
    report
        .outcomes
        .iter()
        .map(|(symbol, outcome)| match outcome {
            InstrumentOutcome::Completed(s) => vec![
                symbol.clone(),
                "ok".to_string(),
                s.bars.to_string(),
                s.bricks.to_string(),
                format!("{}", s.brick_size),
                s.position_changes.to_string(),
                cell(s.kpi.total_return),
                cell(s.kpi.cagr),
                cell(s.kpi.volatility),
                cell(s.kpi.sharpe),
                cell(s.kpi.max_drawdown),
                String::new(),
            ],
            InstrumentOutcome::Unavailable { reason } => {
                let mut row = vec![symbol.clone(), "unavailable".to_string()];
                row.extend(std::iter::repeat_n(String::new(), HEADER.len() - 3));
                row.push(reason.clone());
                row
            }
        })
        .collect()
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &BatchReport, output_path: &str) -> Result<(), RenkoError> {
        let to_err = |e: csv::Error| RenkoError::Data {
            reason: format!("failed to write {}: {}", output_path, e),
        };
        let mut wtr = csv::Writer::from_path(output_path).map_err(to_err)?;
        wtr.write_record(HEADER).map_err(to_err)?;
        for row in report_rows(report) {
            wtr.write_record(&row).map_err(to_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
