use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::types::Interval;

#[derive(Deserialize, Clone)]
pub struct Symbols {
    /// A list of symbols to export liquidation history for.
    pub symbols: Vec<String>,
}

#[derive(Clone)]
pub struct Config {
    /// Symbols to export liquidation history for, e.g. `BTCUSD_PERP.A`.
    pub symbols: Vec<String>,
    /// The bucket size for each liquidation record.
    pub interval: Interval,
    /// The folder the exported CSV (and the run log) is written to.
    pub output_dir: PathBuf,
    /// First calendar day of the range.
    pub start: NaiveDate,
    /// Last calendar day of the range, inclusive.
    pub end: NaiveDate,
    /// Ask the upstream to convert quantities to USD.
    pub convert_to_usd: bool,
}
