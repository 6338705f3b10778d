use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

use crate::types::Decimal;

#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Network or HTTP layer failure: timeouts, refused connections, unparseable bodies
    Transport,
    /// Well-formed exchange response carrying a non-empty `error` list
    Exchange,
    /// Bad user input, bad configuration or insufficient funds
    Validation,
    /// API secret is not valid base64
    InvalidSecret,
    /// Ticker result was empty or its best ask could not be read
    PriceUnavailable,
    /// Computed order volume was not strictly positive
    InvalidVolume,
    /// Local I/O failure, e.g. reading the console
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub fn exchange<S: Into<String>>(method: Method, path: S, codes: Vec<String>) -> Self {
        ExchangeError {
            method,
            path: path.into(),
            codes,
        }
        .into()
    }

    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: S,
        message: S,
    ) -> Self {
        Status {
            status_code,
            method,
            path: path.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn price_unavailable<S: Into<String>>(pair: S, reason: S) -> Self {
        PriceUnavailable {
            pair: pair.into(),
            reason: reason.into(),
        }
        .into()
    }

    #[must_use]
    pub fn invalid_volume(fiat_amount: Decimal, price: Decimal, volume: Decimal) -> Self {
        InvalidVolume {
            fiat_amount,
            price,
            volume,
        }
        .into()
    }

    /// Raw exchange error codes when this is an [`Kind::Exchange`] error.
    #[must_use]
    pub fn exchange_codes(&self) -> Option<&[String]> {
        self.downcast_ref::<ExchangeError>()
            .map(|e| e.codes.as_slice())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Non-2xx response whose body could not be read as an exchange envelope.
#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )
    }
}

impl StdError for Status {}

#[non_exhaustive]
#[derive(Debug)]
pub struct ExchangeError {
    pub method: Method,
    pub path: String,
    pub codes: Vec<String>,
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exchange rejected {} {}: {}",
            self.method,
            self.path,
            self.codes.join(", ")
        )
    }
}

impl StdError for ExchangeError {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

#[non_exhaustive]
#[derive(Debug)]
pub struct PriceUnavailable {
    pub pair: String,
    pub reason: String,
}

impl fmt::Display for PriceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no ask price for {}: {}", self.pair, self.reason)
    }
}

impl StdError for PriceUnavailable {}

#[non_exhaustive]
#[derive(Debug)]
pub struct InvalidVolume {
    pub fiat_amount: Decimal,
    pub price: Decimal,
    pub volume: Decimal,
}

impl fmt::Display for InvalidVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at price {} buys volume {}, must be positive",
            self.fiat_amount, self.price, self.volume
        )
    }
}

impl StdError for InvalidVolume {}

impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Transport, err)
    }
}

impl From<ExchangeError> for Error {
    fn from(err: ExchangeError) -> Self {
        Error::with_source(Kind::Exchange, err)
    }
}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<PriceUnavailable> for Error {
    fn from(err: PriceUnavailable) -> Self {
        Error::with_source(Kind::PriceUnavailable, err)
    }
}

impl From<InvalidVolume> for Error {
    fn from(err: InvalidVolume) -> Self {
        Error::with_source(Kind::InvalidVolume, err)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::with_source(Kind::InvalidSecret, e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<serde_html_form::ser::Error> for Error {
    fn from(e: serde_html_form::ser::Error) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_error_exposes_codes() {
        let err = Error::exchange(
            Method::POST,
            "/0/private/AddOrder",
            vec!["EOrder:Insufficient funds".to_owned()],
        );

        assert_eq!(err.kind(), Kind::Exchange);
        assert_eq!(
            err.exchange_codes(),
            Some(["EOrder:Insufficient funds".to_owned()].as_slice())
        );
        assert!(err.to_string().contains("Insufficient funds"));
    }

    #[test]
    fn validation_has_no_codes() {
        let err = Error::validation("amount must not be negative");

        assert_eq!(err.kind(), Kind::Validation);
        assert!(err.exchange_codes().is_none());
        assert!(err.downcast_ref::<Validation>().is_some());
    }
}
