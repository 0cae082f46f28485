//! Client for the Unwired Labs location API.
//!
//! All towers are sent in a single request under the operator of the first
//! tower. The request is made once; failures are handed back to the caller.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{CellRadio, Field, TowerRecord};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("error sending request: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("error parsing response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Request body of the process endpoint
#[derive(Debug, Serialize)]
pub struct Payload {
    token: String,
    radio: CellRadio,
    mcc: u64,
    mnc: u64,
    cells: Vec<PayloadCell>,
    address: u8,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PayloadCell {
    #[serde(skip_serializing_if = "Option::is_none")]
    lac: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cid: Option<u64>,
}

fn number(record: &TowerRecord, field: Field) -> Option<u64> {
    record.get(field).and_then(|x| x.parse().ok())
}

impl Payload {
    pub fn new(token: &str, radio: CellRadio, records: &[TowerRecord]) -> Self {
        let first = records.first();
        let cells = records
            .iter()
            .map(|x| PayloadCell {
                lac: number(x, Field::TacLac),
                cid: number(x, Field::CellId),
            })
            .filter(|x| x.lac.is_some() || x.cid.is_some())
            .collect();

        Self {
            token: token.to_owned(),
            radio,
            mcc: first.and_then(|x| number(x, Field::Mcc)).unwrap_or_default(),
            mnc: first.and_then(|x| number(x, Field::Mnc)).unwrap_or_default(),
            cells,
            // ask for a reverse geocoded address as well
            address: 1,
        }
    }

    pub fn cells(&self) -> &[PayloadCell] {
        &self.cells
    }
}

/// Fields of interest in a location response.
///
/// The service reports its own errors with `status` and `message`, so every
/// field is optional.
#[derive(Debug, Deserialize)]
pub struct LocationReport {
    pub status: Option<Value>,
    pub message: Option<Value>,
    pub balance: Option<Value>,
    pub lat: Option<Value>,
    pub lon: Option<Value>,
    pub accuracy: Option<Value>,
    pub address: Option<Value>,
}

impl LocationReport {
    /// Labelled values for display, `null` where the response had none.
    pub fn fields(&self) -> [(&'static str, String); 6] {
        [
            ("status", show(&self.status)),
            ("balance", show(&self.balance)),
            ("lat", show(&self.lat)),
            ("lon", show(&self.lon)),
            ("accuracy", format!("{} meters", show(&self.accuracy))),
            ("address", show(&self.address)),
        ]
    }

    /// The service's explanation when it answers with `"status": "error"`.
    pub fn error_message(&self) -> Option<String> {
        match &self.status {
            Some(Value::String(x)) if x == "error" => Some(show(&self.message)),
            _ => None,
        }
    }
}

fn show(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(x)) => x.clone(),
        Some(x) => x.to_string(),
        None => "null".to_owned(),
    }
}

pub struct Client {
    http: reqwest::Client,
    endpoint: String,
}

impl Client {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(http, endpoint))
    }

    pub fn with_http(http: reqwest::Client, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_owned(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn locate(&self, payload: &Payload) -> Result<LocationReport, LookupError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        // read the body first so malformed JSON is told apart from a broken connection
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
