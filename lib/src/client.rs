use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    error::{self, Error},
    types::LiquidationRequest,
};

const BASE_URL: &str = "https://api.coinalyze.net/v1";

/// Classification of a successful fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A body with at least one history row somewhere in it.
    Data(Value),
    /// Null, an empty array, or an array whose histories are all empty.
    Empty,
}

#[derive(Clone)]
pub struct Client {
    inner: reqwest::Client,
    api_key: String,
}

impl Client {
    pub fn new(api_key: &str) -> Result<Self, error::Init> {
        if api_key.trim().is_empty() {
            return Err(error::Init::MissingApiKey);
        }
        let headers = HeaderMap::from_iter([(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        )]);
        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(error::Init::ClientInitialization)?;
        Ok(Self {
            inner,
            api_key: api_key.to_string(),
        })
    }

    /// One GET against the liquidation-history endpoint. No retries, no
    /// paging; upstream failures come back as classified errors rather
    /// than surfacing raw transport panics.
    #[instrument(skip_all, err, fields(symbols = %request.symbols.join(","), interval = %request.interval))]
    pub async fn get_liquidation_history(
        &self,
        request: &LiquidationRequest<'_>,
    ) -> Result<FetchOutcome, Error> {
        let url = self.liquidation_history_url(request)?;
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(Error::SendRequest)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(Error::ReadBody)?;
            return Err(Error::Api {
                status: status.as_u16(),
                message: api_error_message(status, &body),
            });
        }
        let body: Value = response.json().await.map_err(Error::Deserialization)?;
        debug!(status = %status, "Got response");
        if is_empty_response(&body) {
            return Ok(FetchOutcome::Empty);
        }
        Ok(FetchOutcome::Data(body))
    }

    fn liquidation_history_url(
        &self,
        request: &LiquidationRequest<'_>,
    ) -> Result<Url, Error> {
        let params = [
            ("api_key", self.api_key.clone()),
            ("symbols", request.symbols.join(",")),
            ("interval", request.interval.to_string()),
            ("from", request.range.from_epoch().to_string()),
            ("to", request.range.to_epoch().to_string()),
            ("convert_to_usd", request.convert_to_usd.to_string()),
        ];
        Ok(Url::parse_with_params(
            &format!("{BASE_URL}/liquidation-history"),
            &params,
        )?)
    }
}

// The upstream reports failures as `{"error": "..."}`; fall back to the
// HTTP reason phrase when the body is something else.
fn api_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

pub(crate) fn is_empty_response(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Array(entries) => entries.iter().all(|entry| match entry.get("history") {
            None | Some(Value::Null) => true,
            Some(Value::Array(history)) => history.is_empty(),
            Some(_) => false,
        }),
        _ => false,
    }
}
