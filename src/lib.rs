//! Dollar-cost averaging into BTC and SOL on Kraken.
//!
//! The crate is split leaf-first:
//! - [`auth`] signs private requests (`API-Key` / `API-Sign`)
//! - [`nonce`] issues strictly increasing nonces
//! - [`client`] talks to the REST API and decodes the `{error, result}` envelope
//! - [`pricing`] and [`order`] read best asks and submit market buys
//! - [`portfolio`] values balances in EUR and USD
//! - [`dca`] drives one interactive buying run

pub mod auth;
pub mod client;
pub mod dca;
pub mod error;
pub mod nonce;
pub mod order;
pub mod portfolio;
pub mod pricing;
pub mod types;

use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Request};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::field::Empty;

pub use client::KrakenClient;
pub use error::{Error, Kind};

pub type Result<T> = std::result::Result<T, Error>;

pub const KRAKEN: &str = "https://api.kraken.com";

/// Response envelope shared by every Kraken REST endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

/// Sends `request` and decodes the envelope's `result` into `Response`.
///
/// A non-empty `error` list is an [`Kind::Exchange`] error whatever the HTTP status.
/// A body that is not an envelope is a [`Kind::Transport`] error.
#[tracing::instrument(
    level = "debug",
    skip(client, request, headers),
    fields(method = Empty, path = Empty, status_code = Empty)
)]
async fn request<Response: DeserializeOwned>(
    client: &ReqwestClient,
    mut request: Request,
    headers: Option<HeaderMap>,
) -> Result<Response> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let span = tracing::Span::current();
    span.record("method", method.as_str());
    span.record("path", path.as_str());

    if let Some(h) = headers {
        request.headers_mut().extend(h);
    }

    let response = client.execute(request).await?;
    let status_code = response.status();
    span.record("status_code", status_code.as_u16());

    let body = response.text().await?;
    let envelope = match serde_json::from_str::<Envelope>(&body) {
        Ok(envelope) => envelope,
        Err(e) if status_code.is_success() => return Err(e.into()),
        Err(_) => return Err(Error::status(status_code, method, path, body)),
    };

    if !envelope.error.is_empty() {
        tracing::warn!(%method, %path, codes = ?envelope.error, "exchange returned errors");
        return Err(Error::exchange(method, path, envelope.error));
    }
    if !status_code.is_success() {
        return Err(Error::status(status_code, method, path, body));
    }

    let result = envelope.result.unwrap_or(serde_json::Value::Null);
    Ok(serde_json::from_value(result)?)
}
