//! Kraken REST request signing.
//!
//! `API-Sign` is `HMAC-SHA512(base64_decode(secret), path || SHA256(nonce || body))`,
//! base64 encoded. The SHA-256 digest is appended as raw bytes, not as text.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac as _};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret as _, SecretString};
use sha2::{Digest as _, Sha256, Sha512};

use crate::Result;
use crate::error::Error;

pub const API_KEY_HEADER: &str = "API-Key";
pub const API_SIGN_HEADER: &str = "API-Sign";

type HmacSha512 = Hmac<Sha512>;

/// API key pair loaded once at startup.
#[derive(Clone, Debug)]
pub struct Credentials {
    key: String,
    secret: SecretString,
}

impl Credentials {
    /// Builds credentials, rejecting a secret that is not valid base64.
    pub fn new(key: impl Into<String>, secret: SecretString) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(Error::validation("API key is empty"));
        }
        decode_secret(&secret)?;

        Ok(Self { key, secret })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn secret(&self) -> &SecretString {
        &self.secret
    }
}

fn decode_secret(secret: &SecretString) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(secret.expose_secret().trim())?)
}

/// Computes the `API-Sign` value for a private call.
///
/// `canonical_params` must be the exact form-encoded body that is sent, including `nonce`.
pub fn sign(path: &str, canonical_params: &str, nonce: u64, secret: &SecretString) -> Result<String> {
    let key = decode_secret(secret)?;

    let mut inner = Sha256::new();
    inner.update(nonce.to_string().as_bytes());
    inner.update(canonical_params.as_bytes());
    let inner_hash = inner.finalize();

    let mut mac = HmacSha512::new_from_slice(&key)
        .map_err(|e| Error::validation(format!("unusable API secret: {e}")))?;
    mac.update(path.as_bytes());
    mac.update(&inner_hash);

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

pub(crate) fn create_headers(credentials: &Credentials, signature: &str) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();

    map.insert(
        API_KEY_HEADER,
        HeaderValue::from_str(credentials.key())
            .map_err(|e| Error::validation(format!("API key is not a valid header value: {e}")))?,
    );
    map.insert(
        API_SIGN_HEADER,
        HeaderValue::from_str(signature)
            .map_err(|e| Error::validation(format!("signature is not a valid header value: {e}")))?,
    );

    Ok(map)
}
