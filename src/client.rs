use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use url::Url;

use crate::Result;
use crate::auth::{self, Credentials};
use crate::nonce::NonceSequence;
use crate::types::Balance;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const PRIVATE_PREFIX: &str = "/0/private/";
const PUBLIC_PREFIX: &str = "/0/public/";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Kraken REST client holding the API credentials and the nonce sequence.
#[derive(Clone, Debug)]
pub struct KrakenClient {
    host: Url,
    credentials: Credentials,
    nonces: NonceSequence,
    client: ReqwestClient,
}

impl KrakenClient {
    /// Creates a client whose requests fail with a transport error after `timeout`.
    pub fn new(host: Url, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;
        Ok(Self::with_client(host, credentials, client))
    }

    /// Creates a client with a custom HTTP client.
    #[must_use]
    pub fn with_client(host: Url, credentials: Credentials, client: ReqwestClient) -> Self {
        Self {
            host,
            credentials,
            nonces: NonceSequence::new(),
            client,
        }
    }

    /// Replaces the nonce sequence, e.g. to share one across clients using the same key.
    #[must_use]
    pub fn with_nonces(mut self, nonces: NonceSequence) -> Self {
        self.nonces = nonces;
        self
    }

    /// Signs and POSTs `params` to `/0/private/{method}`.
    ///
    /// `nonce` is prepended to `params`; the remaining order is kept as given.
    pub async fn private_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let path = format!("{PRIVATE_PREFIX}{method}");
        let nonce = self.nonces.next();
        let nonce_param = nonce.to_string();

        let mut form: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        form.push(("nonce", nonce_param.as_str()));
        form.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        let body = serde_html_form::to_string(&form)?;

        let signature = auth::sign(&path, &body, nonce, self.credentials.secret())?;
        let mut headers = auth::create_headers(&self.credentials, &signature)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

        tracing::debug!(%path, nonce, "private call");

        let request = self
            .client
            .request(Method::POST, self.endpoint(&path)?)
            .body(body)
            .build()?;

        crate::request(&self.client, request, Some(headers)).await
    }

    /// GETs `/0/public/{method}` with `query`. No signing.
    pub async fn public_call<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let path = format!("{PUBLIC_PREFIX}{method}");

        tracing::debug!(%path, ?query, "public call");

        let request = self
            .client
            .request(Method::GET, self.endpoint(&path)?)
            .query(query)
            .build()?;

        crate::request(&self.client, request, None).await
    }

    pub async fn balance(&self) -> Result<Balance> {
        self.private_call("Balance", &[]).await
    }

    /// Returns whether a balance query succeeds with these credentials.
    pub async fn test_credentials(&self) -> bool {
        match self.balance().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "credential check failed");
                false
            }
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.host.join(path)?)
    }
}
