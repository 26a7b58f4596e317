use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::warn;

/// One exportable row: a history item's fields plus `symbol` and, when the
/// item carries a numeric `t`, `timestamp_iso`.
pub type FlatRecord = Map<String, Value>;

/// Flatten the upstream response into one record per history item.
///
/// The body is an array of `{symbol, history: [...]}` objects. Entries
/// whose `symbol` is not a non-empty string or whose `history` is not an
/// array are skipped whole; the rest still flatten. A body that is not an
/// array flattens to nothing, which downstream treats as "no data" rather
/// than a failure.
pub fn flatten(body: &Value) -> Vec<FlatRecord> {
    let Some(entries) = body.as_array() else {
        warn!("response body is not an array, nothing to flatten");
        return Vec::new();
    };

    let mut records = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let symbol = entry
            .get("symbol")
            .and_then(Value::as_str)
            .filter(|symbol| !symbol.is_empty());
        let history = entry.get("history").and_then(Value::as_array);
        let (Some(symbol), Some(history)) = (symbol, history) else {
            warn!(index, "skipping entry without a usable symbol and history array");
            continue;
        };
        for item in history {
            let Some(fields) = item.as_object() else {
                warn!(index, symbol, "skipping non-object history item");
                continue;
            };
            records.push(flat_record(symbol, fields));
        }
    }
    records
}

// Copies the item rather than patching it in place, so the raw body stays
// untouched. The item's own keys keep their encounter order; the stamps
// go after them.
fn flat_record(symbol: &str, fields: &Map<String, Value>) -> FlatRecord {
    let mut record = fields.clone();
    record.insert("symbol".to_string(), Value::String(symbol.to_string()));
    if let Some(iso) = fields.get("t").and_then(epoch_millis).and_then(iso_8601) {
        record.insert("timestamp_iso".to_string(), Value::String(iso));
    }
    record
}

// `t` is epoch milliseconds on the wire.
fn epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

fn iso_8601(millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}
