#![allow(dead_code, reason = "Each test binary uses a different subset")]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use httpmock::Method::{GET, POST};
use httpmock::{Mock, MockServer};
use kraken_dca::auth::Credentials;
use kraken_dca::dca::{Console, DcaConfig, DcaPolicies, DefaultAmounts};
use kraken_dca::nonce::NonceSequence;
use kraken_dca::{Error, KrakenClient, Result};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

pub const API_KEY: &str = "test-api-key";
pub const SECRET: &str = "kQH5HW/8p1uGOVjbgWA7FunAmGO8lsSUXNsu3eow76sz84Q18fWxnyRzBHCd3pd5nE9qa99HAZtuZuj6F1huXg==";
pub const NONCE: u64 = 1_616_492_376_594;

pub fn secret() -> SecretString {
    SecretString::from(SECRET)
}

pub fn credentials() -> Credentials {
    Credentials::new(API_KEY, secret()).expect("valid credentials")
}

/// Client pointed at `server` whose nonces start at [`NONCE`] and advance by one.
pub fn client(server: &MockServer) -> KrakenClient {
    client_with_timeout(server, Duration::from_secs(5))
}

pub fn client_with_timeout(server: &MockServer, timeout: Duration) -> KrakenClient {
    let host = Url::parse(&server.base_url()).expect("mock server url");
    KrakenClient::new(host, credentials(), timeout)
        .expect("http client")
        .with_nonces(NonceSequence::with_clock(Arc::new(|| NONCE)))
}

pub fn config(server: &MockServer, amounts: DefaultAmounts, policies: DcaPolicies) -> DcaConfig {
    let host = Url::parse(&server.base_url()).expect("mock server url");
    DcaConfig::new(host, credentials(), amounts, Duration::from_secs(5), policies)
        .expect("valid config")
}

pub async fn ticker<'a>(server: &'a MockServer, pair: &str, ask: &str) -> Mock<'a> {
    let pair = pair.to_owned();
    let mut result = serde_json::Map::new();
    result.insert(
        pair.clone(),
        json!({ "a": [ask, "1", "1.000"], "b": ["1", "1", "1.000"] }),
    );
    server
        .mock_async(move |when, then| {
            when.method(GET)
                .path("/0/public/Ticker")
                .query_param("pair", &pair);
            then.status(200)
                .json_body(json!({ "error": [], "result": result }));
        })
        .await
}

/// Ticker mocks for BTC and SOL in EUR and USD.
pub async fn all_tickers(server: &MockServer) -> Vec<Mock<'_>> {
    vec![
        ticker(server, "XXBTZEUR", "60000.00000").await,
        ticker(server, "XXBTZUSD", "65000.00000").await,
        ticker(server, "SOLEUR", "150.00").await,
        ticker(server, "SOLUSD", "162.50").await,
    ]
}

pub async fn balance(server: &MockServer, result: Value) -> Mock<'_> {
    server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/0/private/Balance")
                .header("API-Key", API_KEY)
                .header_exists("API-Sign");
            then.status(200).json_body(json!({ "error": [], "result": result }));
        })
        .await
}

pub async fn add_order<'a>(server: &'a MockServer, pair: &str, txid: &str) -> Mock<'a> {
    let pair = pair.to_owned();
    let txid = txid.to_owned();
    server
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/0/private/AddOrder")
                .body_includes(format!("pair={pair}&type=buy&ordertype=market&volume="));
            then.status(200).json_body(json!({
                "error": [],
                "result": {
                    "descr": { "order": format!("buy {pair} @ market") },
                    "txid": [txid]
                }
            }));
        })
        .await
}

/// Console answering prompts from a script and recording everything shown.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub shown: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn prompt(&mut self, message: &str) -> Result<String> {
        self.prompts.push(message.to_owned());
        self.answers
            .pop_front()
            .ok_or_else(|| Error::validation(format!("unexpected prompt: {message}")))
    }

    fn show(&mut self, message: &str) {
        self.shown.push(message.to_owned());
    }
}
