use std::{path::PathBuf, str::FromStr};

use anyhow::{bail, Context, Error, Result};
use chrono::NaiveDate;
use clap::Parser;
use coinalyze_data::{
    config::{Config, Symbols},
    service::Service,
    types::Interval,
};
use std::fs;
use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, EnvFilter};

/// CLI tool to export liquidation history from Coinalyze
#[derive(Parser, Debug)]
struct Args {
    /// The symbols to export liquidation history for, comma separated.
    /// E.g. `BTCUSD_PERP.A,ETHUSD_PERP.A`
    #[clap(short, long, value_delimiter = ',')]
    symbols: Vec<String>,
    /// File path to a config file that lists the symbols, as an
    /// alternative to passing them on the command line
    #[clap(short, long, conflicts_with = "symbols")]
    config: Option<PathBuf>,
    /// The bucket size for each liquidation record
    #[clap(short, long, default_value_t, value_parser = Interval::from_str)]
    interval: Interval,
    /// The folder to save the exported CSV and the run log
    #[clap(short, long)]
    output_dir: PathBuf,
    /// The starting date to pull data from
    #[clap(short, long)]
    from: NaiveDate,
    /// The ending date to pull data to, inclusive
    #[clap(short, long)]
    to: NaiveDate,
    /// Ask the upstream to convert base-asset quantities to USD
    #[clap(long)]
    convert_to_usd: bool,
    #[clap(env = "COINALYZE_API_KEY")]
    api_key: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let file_appender = tracing_appender::rolling::daily(
        args.output_dir.clone(),
        "coinalyze-data.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .with(EnvFilter::from_default_env())
        .init();
    let api_key = args.api_key.clone();
    let config = args.try_into()?;
    let service = Service::new(config, &api_key)?;
    service.run().await?;
    Ok(())
}

impl TryFrom<Args> for Config {
    type Error = Error;
    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let symbols = match args.config {
            Some(path) => parse_config(path)?.symbols,
            None => args.symbols,
        };
        let symbols: Vec<String> = symbols
            .into_iter()
            .map(|symbol| symbol.trim().to_string())
            .filter(|symbol| !symbol.is_empty())
            .collect();
        if symbols.is_empty() {
            bail!("no symbols provided; pass --symbols or --config");
        }
        Ok(Self {
            symbols,
            interval: args.interval,
            output_dir: args.output_dir,
            start: args.from,
            end: args.to,
            convert_to_usd: args.convert_to_usd,
        })
    }
}

fn parse_config(path: PathBuf) -> Result<Symbols, Error> {
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;

    let extension = path
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("");

    match extension {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| "Failed to parse YAML"),
        "toml" => {
            toml::from_str(&contents).with_context(|| "Failed to parse TOML")
        }
        "json" => serde_json::from_str(&contents)
            .with_context(|| "Failed to parse JSON"),
        _ => {
            bail!("Unknown extension")
        }
    }
}
