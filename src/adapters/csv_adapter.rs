//! CSV file data adapter.
//!
//! One file per instrument, `<directory>/<SYMBOL>.csv`, with a header row
//! naming the columns `timestamp, open, high, low, close, adj_close, volume`
//! (case-insensitive; `datetime`/`date` and `adj close` are accepted too).
//! Blank or `NaN` cells become NaN and are dropped by the pipeline's cleaning
//! step.

use crate::domain::error::RenkoError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, RenkoError> {
        let find = |names: &[&str]| -> Result<usize, RenkoError> {
            headers
                .iter()
                .position(|h| {
                    let h = h.trim().to_lowercase().replace(' ', "_");
                    names.contains(&h.as_str())
                })
                .ok_or_else(|| RenkoError::Data {
                    reason: format!("missing {} column", names[0]),
                })
        };
        Ok(Self {
            timestamp: find(&["timestamp", "datetime", "date"])?,
            open: find(&["open"])?,
            high: find(&["high"])?,
            low: find(&["low"])?,
            close: find(&["close"])?,
            adj_close: find(&["adj_close", "adjclose"])?,
            volume: find(&["volume"])?,
        })
    }
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, RenkoError> {
    let value = value.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }
    // exchange-local wall clock, offset discarded
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(value, format) {
            return Ok(ts.naive_local());
        }
    }
    Err(RenkoError::Data {
        reason: format!("invalid timestamp: {}", value),
    })
}

fn parse_number(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, RenkoError> {
    let raw = record.get(index).map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|e| RenkoError::Data {
        reason: format!("invalid {} value {:?}: {}", name, raw, e),
    })
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, RenkoError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| RenkoError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| RenkoError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Columns::from_headers(headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| RenkoError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let timestamp = parse_timestamp(record.get(columns.timestamp).unwrap_or(""))?;
            bars.push(Bar {
                timestamp,
                open: parse_number(&record, columns.open, "open")?,
                high: parse_number(&record, columns.high, "high")?,
                low: parse_number(&record, columns.low, "low")?,
                close: parse_number(&record, columns.close, "close")?,
                adj_close: parse_number(&record, columns.adj_close, "adj_close")?,
                volume: parse_number(&record, columns.volume, "volume")?,
            });
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, RenkoError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| RenkoError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RenkoError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
