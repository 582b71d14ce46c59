//! Report generation port trait.

use crate::domain::error::RenkoError;
use crate::domain::pipeline::BatchReport;

/// Port for writing the per-instrument KPI table.
pub trait ReportPort {
    fn write(&self, report: &BatchReport, output_path: &str) -> Result<(), RenkoError>;
}
