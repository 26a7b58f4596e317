use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use crate::{
    client::{Client, FetchOutcome},
    config::Config,
    error::Error,
    export::{export_filename, to_csv, write_csv},
    flatten::flatten,
    status::{Severity, StatusLine},
    types::{DateRange, LiquidationRequestBuilder},
};

/// What a completed run produced.
#[derive(Debug)]
pub enum ExportOutcome {
    /// A CSV landed on disk.
    Saved { path: PathBuf, records: usize },
    /// The upstream had nothing for this query.
    NoData,
    /// The upstream answered, but nothing in the body was usable.
    NoRecords,
}

pub struct Service {
    client: Client,
    config: Config,
}

impl Service {
    pub fn new(config: Config, api_key: &str) -> Result<Self, Error> {
        let client = Client::new(api_key)?;
        Ok(Self { client, config })
    }

    /// Run the whole pipeline once: fetch, flatten, serialize, export.
    /// The status line is finished on every path, so the terminal is
    /// never left with a live spinner.
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result<ExportOutcome, Error> {
        let status = StatusLine::new();
        let result = self.run_inner(&status).await;
        match &result {
            Ok(ExportOutcome::Saved { path, records }) => status.finish(
                Severity::Success,
                format!("Saved {records} liquidation records to {}", path.display()),
            ),
            Ok(ExportOutcome::NoData) => status.finish(
                Severity::Info,
                "No valid history data found for the selected symbols and date range.",
            ),
            Ok(ExportOutcome::NoRecords) => status.finish(
                Severity::Info,
                "Response did not contain usable liquidation history; nothing to export.",
            ),
            Err(e) => status.finish(Severity::Error, e.to_string()),
        }
        result
    }

    async fn run_inner(&self, status: &StatusLine) -> Result<ExportOutcome, Error> {
        info!(
            num_symbols = self.config.symbols.len(),
            interval = %self.config.interval,
            output_dir = ?self.config.output_dir,
            from = %self.config.start,
            to = %self.config.end,
            convert_to_usd = self.config.convert_to_usd,
            "Starting liquidation history export..."
        );

        let range = DateRange::local_days(self.config.start, self.config.end)?;
        let request = LiquidationRequestBuilder::default()
            .symbols(&self.config.symbols)
            .interval(self.config.interval)
            .range(range)
            .convert_to_usd(self.config.convert_to_usd)
            .build()?;

        status.update("Fetching liquidation history...");
        let body = match self.client.get_liquidation_history(&request).await? {
            FetchOutcome::Empty => {
                warn!("Got no results");
                return Ok(ExportOutcome::NoData);
            }
            FetchOutcome::Data(body) => body,
        };

        status.update("Flattening response...");
        let records = flatten(&body);
        if records.is_empty() {
            warn!("Response flattened to zero records");
            return Ok(ExportOutcome::NoRecords);
        }
        debug!(num_records = records.len(), "Flattened response");

        status.update("Writing CSV...");
        let csv = to_csv(&records)?;
        let filename = export_filename(
            &self.config.symbols,
            self.config.interval,
            self.config.start,
            self.config.end,
        );
        let path = write_csv(&self.config.output_dir, &filename, &csv).await?;

        info!(
            path = ?path,
            num_records = records.len(),
            "Finished exporting liquidation history!"
        );
        Ok(ExportOutcome::Saved {
            path,
            records: records.len(),
        })
    }
}
