//! NCBI Datasets taxonomy lookup.
//!
//! Endpoint used:
//!   GET {base_url}/taxonomy/taxon/{taxid}
//!
//! Responses are normalised into `TaxonomyError` so the proxy route can map
//! them to 400 / 404 / 503 / 504 / 500.

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use primerwatch_common::error::ApiError;
use primerwatch_config::TaxonomyConfig;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("TaxID {0} was not found in NCBI Taxonomy")]
    NotFound(i64),

    #[error("Taxonomy service is unreachable: {0}")]
    Unreachable(String),

    #[error("Taxonomy service timed out")]
    Timeout,

    #[error("Taxonomy lookup failed: {0}")]
    Upstream(String),
}

impl TaxonomyError {
    pub fn status_code(&self) -> u16 {
        match self {
            TaxonomyError::InvalidInput(_) => 400,
            TaxonomyError::NotFound(_) => 404,
            TaxonomyError::Unreachable(_) => 503,
            TaxonomyError::Timeout => 504,
            TaxonomyError::Upstream(_) => 500,
        }
    }

    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TaxonomyError::Timeout
        } else if e.is_connect() {
            TaxonomyError::Unreachable(e.to_string())
        } else {
            TaxonomyError::Upstream(e.to_string())
        }
    }
}

impl From<TaxonomyError> for ApiError {
    fn from(err: TaxonomyError) -> Self {
        let message = err.to_string();
        match err {
            TaxonomyError::InvalidInput(_) => ApiError::BadRequest(message),
            TaxonomyError::NotFound(_) => ApiError::NotFound(message),
            TaxonomyError::Unreachable(_) => ApiError::ServiceUnavailable(message),
            TaxonomyError::Timeout => ApiError::GatewayTimeout(message),
            TaxonomyError::Upstream(_) => ApiError::Internal(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyRecord {
    pub taxid: i64,
    pub species_name: String,
    pub rank: Option<String>,
}

/// Accepts ASCII digits only, value > 0.
pub fn parse_taxid(raw: &str) -> Result<i64, TaxonomyError> {
    let raw = raw.trim();
    let invalid = || TaxonomyError::InvalidInput(format!("\"{}\" is not a valid TaxID", raw));
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid()),
    }
}

pub struct TaxonomyClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl TaxonomyClient {
    pub fn new(config: &TaxonomyConfig) -> Result<Self, TaxonomyError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TaxonomyError::Upstream(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key(),
        })
    }

    #[instrument(skip(self))]
    pub async fn lookup(&self, taxid: i64) -> Result<TaxonomyRecord, TaxonomyError> {
        if taxid <= 0 {
            return Err(TaxonomyError::InvalidInput(format!("\"{}\" is not a valid TaxID", taxid)));
        }
        let url = format!("{}/taxonomy/taxon/{}", self.base_url, taxid);
        let mut request = self.client.get(&url).header("accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key.expose_secret());
        }

        let resp = request.send().await.map_err(TaxonomyError::from_transport)?;
        let status = resp.status();
        debug!(%status, "taxonomy response");

        match status {
            StatusCode::NOT_FOUND => return Err(TaxonomyError::NotFound(taxid)),
            StatusCode::BAD_REQUEST => {
                return Err(TaxonomyError::InvalidInput(format!("\"{}\" is not a valid TaxID", taxid)))
            }
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                warn!(%status, "taxonomy service unavailable");
                return Err(TaxonomyError::Unreachable(format!("HTTP {}", status.as_u16())));
            }
            s if !s.is_success() => {
                warn!(%status, "taxonomy lookup failed");
                return Err(TaxonomyError::Upstream(format!("HTTP {}", s.as_u16())));
            }
            _ => {}
        }

        let body: Value = resp.json().await.map_err(TaxonomyError::from_transport)?;
        parse_taxon(taxid, &body)
    }
}

fn parse_taxon(taxid: i64, body: &Value) -> Result<TaxonomyRecord, TaxonomyError> {
    let node = body["taxonomy_nodes"]
        .as_array()
        .and_then(|nodes| nodes.first())
        .ok_or(TaxonomyError::NotFound(taxid))?;

    if node.get("errors").and_then(Value::as_array).is_some_and(|e| !e.is_empty()) {
        return Err(TaxonomyError::NotFound(taxid));
    }

    let taxonomy = &node["taxonomy"];
    let species_name = taxonomy["organism_name"]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or(TaxonomyError::NotFound(taxid))?;

    Ok(TaxonomyRecord {
        taxid: taxonomy["tax_id"].as_i64().unwrap_or(taxid),
        species_name: species_name.to_string(),
        rank: taxonomy["rank"].as_str().map(|r| r.to_lowercase()),
    })
}
