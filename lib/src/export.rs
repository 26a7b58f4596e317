use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::WriterBuilder;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::{
    error::{self, Error},
    flatten::FlatRecord,
    types::Interval,
};

const PRIORITY_COLUMNS: [&str; 2] = ["symbol", "timestamp_iso"];
const MAX_SYMBOLS_SEGMENT: usize = 50;

/// Serialize records into one CSV blob. Empty input yields the empty
/// string; otherwise a header line plus one line per record.
///
/// The header is the first record's keys with `symbol` and `timestamp_iso`
/// pulled to the front. Every record is projected onto exactly those
/// columns: fields a record lacks render empty, and fields the first
/// record lacks never appear.
pub fn to_csv(records: &[FlatRecord]) -> Result<String, Error> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };

    let header = header_columns(first);
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&header).map_err(error::FileIo::Csv)?;
    for record in records {
        let row = header.iter().map(|column| cell(record.get(column.as_str())));
        writer.write_record(row).map_err(error::FileIo::Csv)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| error::FileIo::FileWrite(e.into_error()))?;

    let csv = String::from_utf8_lossy(&bytes).into_owned();
    if csv.is_empty() {
        return Err(Error::EmptySerialization);
    }
    Ok(csv)
}

fn header_columns(first: &FlatRecord) -> Vec<String> {
    let mut columns: Vec<String> = PRIORITY_COLUMNS
        .iter()
        .filter(|name| first.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    columns.extend(
        first
            .keys()
            .filter(|key| !PRIORITY_COLUMNS.contains(&key.as_str()))
            .cloned(),
    );
    columns
}

fn cell(value: Option<&Value>) -> String {
    match value {
        // Null and absent are indistinguishable in the output.
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Derive the artifact name from the query that produced it.
pub fn export_filename(
    symbols: &[String],
    interval: Interval,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    let symbols = sanitize_symbols(&symbols.join(","));
    format!("coinalyze_liquidations_{symbols}_{interval}_{start}_to_{end}.csv")
}

// Keep the name shell-friendly: anything outside [a-zA-Z0-9_,.-] becomes
// an underscore, and the symbols segment is capped at 50 characters.
fn sanitize_symbols(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_SYMBOLS_SEGMENT)
        .collect()
}

/// Write the blob under `output_dir` and hand back the final path.
pub async fn write_csv(
    output_dir: &Path,
    filename: &str,
    csv: &str,
) -> Result<PathBuf, Error> {
    fs::create_dir_all(output_dir)
        .await
        .map_err(error::FileIo::CreateFile)?;
    let path = output_dir.join(filename);
    fs::write(&path, csv)
        .await
        .map_err(error::FileIo::FileWrite)?;
    debug!(path = ?path, bytes = csv.len(), "Wrote CSV artifact");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{export_filename, sanitize_symbols, to_csv, write_csv};
    use crate::{flatten::flatten, types::Interval};

    #[test]
    fn liquidation_rows_serialize_exactly() {
        let records = flatten(&json!([
            {"symbol": "BTCUSD", "history": [{"t": 1_700_000_000_000i64, "l": 100, "s": 50}]}
        ]));
        let csv = to_csv(&records).unwrap();
        assert_eq!(
            csv,
            "symbol,timestamp_iso,t,l,s\nBTCUSD,2023-11-14T22:13:20.000Z,1700000000000,100,50\n"
        );
    }

    #[test]
    fn empty_input_is_the_empty_string() {
        assert_eq!(to_csv(&[]).unwrap(), "");
    }

    #[test]
    fn serialization_is_idempotent() {
        let records = flatten(&json!([
            {"symbol": "BTCUSD", "history": [{"t": 1i64, "l": 2, "s": 3}, {"t": 4i64, "l": 5}]}
        ]));
        assert_eq!(to_csv(&records).unwrap(), to_csv(&records).unwrap());
    }

    #[test]
    fn awkward_values_survive_a_round_trip() {
        let records = flatten(&json!([
            {"symbol": "BTC,USD", "history": [
                {"t": 1i64, "note": "say \"when\"", "memo": "line one\nline two"}
            ]}
        ]));
        let csv = to_csv(&records).unwrap();

        let mut reader = csv::ReaderBuilder::new().from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        let row = reader.records().next().unwrap().unwrap();
        let field = |name: &str| {
            let position = headers.iter().position(|h| h == name).unwrap();
            row.get(position).unwrap().to_string()
        };
        assert_eq!(field("symbol"), "BTC,USD");
        assert_eq!(field("note"), "say \"when\"");
        assert_eq!(field("memo"), "line one\nline two");
    }

    #[test]
    fn later_records_project_onto_the_first_header() {
        let records = flatten(&json!([
            {"symbol": "BTCUSD", "history": [{"t": 1i64, "l": 100}]},
            {"symbol": "ETHUSD", "history": [{"t": 2i64, "s": 7}]}
        ]));
        let csv = to_csv(&records).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "symbol,timestamp_iso,t,l");
        assert_eq!(
            lines.next().unwrap(),
            "BTCUSD,1970-01-01T00:00:00.001Z,1,100"
        );
        // The second record's `s` never appears and its missing `l` is blank.
        assert_eq!(lines.next().unwrap(), "ETHUSD,1970-01-01T00:00:00.002Z,2,");
        assert!(lines.next().is_none());
    }

    #[test]
    fn filename_reflects_the_query() {
        let symbols = vec!["BTCUSD_PERP.A".to_string(), "ETHUSD_PERP.A".to_string()];
        let name = export_filename(
            &symbols,
            Interval::Hour1,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        assert_eq!(
            name,
            "coinalyze_liquidations_BTCUSD_PERP.A,ETHUSD_PERP.A_1hour_2024-01-01_to_2024-03-31.csv"
        );
    }

    #[test]
    fn filename_symbols_are_sanitized_and_capped() {
        assert_eq!(sanitize_symbols("BTC/USD:perp soon"), "BTC_USD_perp_soon");
        assert_eq!(sanitize_symbols(&"A".repeat(80)).len(), 50);
    }

    #[tokio::test]
    async fn write_csv_creates_the_directory() {
        let dir = std::env::temp_dir()
            .join("coinalyze-data-test")
            .join("nested");
        let path = write_csv(&dir, "check.csv", "a,b\n1,2\n").await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "a,b\n1,2\n");
        let _ = tokio::fs::remove_dir_all(dir.parent().unwrap()).await;
    }
}
