//! Market data access port trait.

use crate::domain::error::RenkoError;
use crate::domain::ohlcv::Bar;

/// Source of raw intraday bars for one instrument at a time.
///
/// Implementations return bars as the feed delivered them; rows may be
/// incomplete or unordered; the pipeline cleans them before use.
pub trait DataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, RenkoError>;

    fn list_symbols(&self) -> Result<Vec<String>, RenkoError>;
}
