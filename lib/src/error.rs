use displaydoc::Display;
use thiserror::Error;

use crate::types::LiquidationRequestBuilderError;

#[derive(Debug, Display, Error)]
pub enum Error {
    /// Init error: {0}
    Init(#[from] Init),
    /// Io: {0}
    File(#[from] FileIo),
    /// URL is not valid
    InvalidUrl(#[from] url::ParseError),
    /// Error sending request: {0}
    SendRequest(reqwest::Error),
    /// Failed to read response body: {0}
    ReadBody(reqwest::Error),
    /// Failed to deserialize response: {0}
    Deserialization(reqwest::Error),
    /// Error {status}: {message}
    Api { status: u16, message: String },
    /// Invalid liquidation request: {0}
    InvalidRequest(#[from] LiquidationRequestBuilderError),
    /// Invalid date range selected
    InvalidDateRange,
    /// CSV serialization produced no output
    EmptySerialization,
}

#[derive(Debug, Display, Error)]
pub enum Init {
    /// Failed to initialize the client: {0}
    ClientInitialization(reqwest::Error),
    /// API key must not be empty
    MissingApiKey,
}

#[derive(Debug, Display, Error)]
pub enum FileIo {
    /// Error writing CSV: {0}
    Csv(#[from] csv::Error),
    /// Error writing file: {0}
    FileWrite(std::io::Error),
    /// Error creating file: {0}
    CreateFile(std::io::Error),
}
