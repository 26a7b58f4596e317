use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(
    Debug,
    Default,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
)]
pub enum Interval {
    /// One-minute liquidation buckets, the upstream's finest granularity.
    #[serde(rename = "1min")]
    #[strum(serialize = "1min")]
    Min1,
    #[serde(rename = "5min")]
    #[strum(serialize = "5min")]
    Min5,
    #[serde(rename = "15min")]
    #[strum(serialize = "15min")]
    Min15,
    #[serde(rename = "30min")]
    #[strum(serialize = "30min")]
    Min30,
    #[default]
    #[serde(rename = "1hour")]
    #[strum(serialize = "1hour")]
    Hour1,
    #[serde(rename = "2hour")]
    #[strum(serialize = "2hour")]
    Hour2,
    #[serde(rename = "4hour")]
    #[strum(serialize = "4hour")]
    Hour4,
    #[serde(rename = "6hour")]
    #[strum(serialize = "6hour")]
    Hour6,
    #[serde(rename = "12hour")]
    #[strum(serialize = "12hour")]
    Hour12,
    /// One bucket per calendar day, the upstream's coarsest granularity.
    #[serde(rename = "daily")]
    #[strum(serialize = "daily")]
    Daily,
}

/// A calendar-date pair resolved to concrete instants: the start date's
/// midnight through 23:59:59.999 on the end date (inclusive end of day).
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub(crate) from: DateTime<Utc>,
    pub(crate) to: DateTime<Utc>,
}

impl DateRange {
    /// Resolve the date pair in the machine's local zone.
    pub fn local_days(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        Self::days_in(start, end, &chrono::Local)
    }

    pub fn days_in<Tz: TimeZone>(
        start: NaiveDate,
        end: NaiveDate,
        tz: &Tz,
    ) -> Result<Self, Error> {
        // A DST gap can make midnight nonexistent; take the earliest
        // instant that exists on that day.
        let from = start
            .and_hms_opt(0, 0, 0)
            .and_then(|start| tz.from_local_datetime(&start).earliest())
            .ok_or(Error::InvalidDateRange)?
            .with_timezone(&Utc);
        let to = end
            .and_hms_milli_opt(23, 59, 59, 999)
            .and_then(|end| tz.from_local_datetime(&end).earliest())
            .ok_or(Error::InvalidDateRange)?
            .with_timezone(&Utc);
        if from >= to {
            return Err(Error::InvalidDateRange);
        }
        Ok(Self { from, to })
    }

    /// Start of the range in UNIX seconds.
    pub fn from_epoch(&self) -> i64 {
        self.from.timestamp()
    }

    /// End of the range in UNIX seconds (the last whole second of the day).
    pub fn to_epoch(&self) -> i64 {
        self.to.timestamp()
    }
}

#[derive(Builder)]
pub struct LiquidationRequest<'a> {
    pub(crate) symbols: &'a [String],
    #[builder(default)]
    pub(crate) interval: Interval,
    pub(crate) range: DateRange,
    #[builder(default)]
    pub(crate) convert_to_usd: bool,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn interval_strings_round_trip() {
        for (text, interval) in [
            ("1min", Interval::Min1),
            ("5min", Interval::Min5),
            ("15min", Interval::Min15),
            ("30min", Interval::Min30),
            ("1hour", Interval::Hour1),
            ("2hour", Interval::Hour2),
            ("4hour", Interval::Hour4),
            ("6hour", Interval::Hour6),
            ("12hour", Interval::Hour12),
            ("daily", Interval::Daily),
        ] {
            assert_eq!(Interval::from_str(text).unwrap(), interval);
            assert_eq!(interval.to_string(), text);
        }
    }

    #[test]
    fn unknown_interval_is_rejected() {
        assert!(Interval::from_str("90min").is_err());
    }

    #[test]
    fn same_day_range_still_spans_the_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let range = DateRange::days_in(day, day, &Utc).unwrap();
        assert!(range.from_epoch() < range.to_epoch());
        assert_eq!(range.from_epoch(), 1_704_067_200);
        assert_eq!(range.to_epoch(), 1_704_153_599);
    }

    #[test]
    fn reversed_dates_are_invalid() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            DateRange::days_in(start, end, &Utc),
            Err(Error::InvalidDateRange)
        ));
    }

    #[test]
    fn request_builder_requires_a_range() {
        let symbols = vec!["BTCUSD_PERP.A".to_string()];
        assert!(LiquidationRequestBuilder::default()
            .symbols(&symbols)
            .build()
            .is_err());
    }
}
