use std::str::FromStr as _;
use std::time::Duration;

use rust_decimal_macros::dec;
use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::auth::Credentials;
use crate::client::{DEFAULT_TIMEOUT, KrakenClient};
use crate::dca::policy::DcaPolicies;
use crate::error::Error;
use crate::types::{Asset, Decimal};
use crate::KRAKEN;

pub const DEFAULT_AMOUNT_EUR: Decimal = dec!(250);

/// Unvalidated settings as read from the environment or command line.
#[derive(Clone, Debug)]
pub struct RawDcaConfig {
    pub api_key: String,
    pub api_secret: SecretString,
    pub host: Option<String>,
    pub btc_amount_eur: Option<String>,
    pub sol_amount_eur: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Default EUR spent per asset when the user accepts the offered amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultAmounts {
    pub btc: Decimal,
    pub sol: Decimal,
}

impl DefaultAmounts {
    #[must_use]
    pub fn get(&self, asset: Asset) -> Decimal {
        match asset {
            Asset::Btc => self.btc,
            Asset::Sol => self.sol,
        }
    }

    /// `None` when the sum does not fit in a [`Decimal`].
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.btc.checked_add(self.sol)
    }
}

impl Default for DefaultAmounts {
    fn default() -> Self {
        Self {
            btc: DEFAULT_AMOUNT_EUR,
            sol: DEFAULT_AMOUNT_EUR,
        }
    }
}

/// Validated configuration for a DCA run.
#[derive(Clone, Debug)]
pub struct DcaConfig {
    pub host: Url,
    pub credentials: Credentials,
    pub amounts: DefaultAmounts,
    pub timeout: Duration,
    pub policies: DcaPolicies,
}

impl DcaConfig {
    pub fn from_raw(raw: RawDcaConfig, policies: DcaPolicies) -> Result<Self> {
        let host = Url::parse(raw.host.as_deref().unwrap_or(KRAKEN))?;
        let credentials = Credentials::new(raw.api_key, raw.api_secret)?;
        let amounts = DefaultAmounts {
            btc: parse_amount_setting("BTC", raw.btc_amount_eur.as_deref())?,
            sol: parse_amount_setting("SOL", raw.sol_amount_eur.as_deref())?,
        };
        let timeout = raw
            .timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Self::new(host, credentials, amounts, timeout, policies)
    }

    pub fn new(
        host: Url,
        credentials: Credentials,
        amounts: DefaultAmounts,
        timeout: Duration,
        policies: DcaPolicies,
    ) -> Result<Self> {
        if !matches!(host.scheme(), "http" | "https") {
            return Err(Error::validation(format!(
                "host must be an http(s) URL, got {host}"
            )));
        }
        if amounts.btc.is_sign_negative() || amounts.sol.is_sign_negative() {
            return Err(Error::validation(format!(
                "default amounts must not be negative, got BTC {} / SOL {}",
                amounts.btc, amounts.sol
            )));
        }
        if timeout.is_zero() {
            return Err(Error::validation("timeout must be greater than zero"));
        }

        Ok(Self {
            host,
            credentials,
            amounts,
            timeout,
            policies,
        })
    }

    /// Builds the REST client for this configuration.
    pub fn client(&self) -> Result<KrakenClient> {
        KrakenClient::new(self.host.clone(), self.credentials.clone(), self.timeout)
    }
}

fn parse_amount_setting(asset: &str, value: Option<&str>) -> Result<Decimal> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_AMOUNT_EUR);
    };

    Decimal::from_str(value)
        .map_err(|e| Error::validation(format!("invalid {asset} amount `{value}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Kind;

    fn raw() -> RawDcaConfig {
        RawDcaConfig {
            api_key: "key".to_owned(),
            api_secret: SecretString::from("c2VjcmV0"),
            host: None,
            btc_amount_eur: None,
            sol_amount_eur: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn defaults_apply() -> Result<()> {
        let config = DcaConfig::from_raw(raw(), DcaPolicies::default())?;

        assert_eq!(config.host.as_str(), "https://api.kraken.com/");
        assert_eq!(config.amounts, DefaultAmounts::default());
        assert_eq!(config.amounts.total(), Some(dec!(500)));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        Ok(())
    }

    #[test]
    fn amounts_are_parsed() -> Result<()> {
        let config = DcaConfig::from_raw(
            RawDcaConfig {
                btc_amount_eur: Some("100.50".to_owned()),
                sol_amount_eur: Some("0".to_owned()),
                timeout_secs: Some(3),
                ..raw()
            },
            DcaPolicies::unattended(),
        )?;

        assert_eq!(config.amounts.get(Asset::Btc), dec!(100.50));
        assert_eq!(config.amounts.get(Asset::Sol), Decimal::ZERO);
        assert_eq!(config.timeout, Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn total_overflow_is_none() {
        let amounts = DefaultAmounts {
            btc: Decimal::MAX,
            sol: Decimal::MAX,
        };

        assert_eq!(amounts.total(), None);
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            (
                RawDcaConfig {
                    btc_amount_eur: Some("lots".to_owned()),
                    ..raw()
                },
                Kind::Validation,
            ),
            (
                RawDcaConfig {
                    sol_amount_eur: Some("-5".to_owned()),
                    ..raw()
                },
                Kind::Validation,
            ),
            (
                RawDcaConfig {
                    host: Some("not a url".to_owned()),
                    ..raw()
                },
                Kind::Validation,
            ),
            (
                RawDcaConfig {
                    timeout_secs: Some(0),
                    ..raw()
                },
                Kind::Validation,
            ),
            (
                RawDcaConfig {
                    api_secret: SecretString::from("***"),
                    ..raw()
                },
                Kind::InvalidSecret,
            ),
        ];

        for (raw, kind) in cases {
            let err = DcaConfig::from_raw(raw, DcaPolicies::default()).unwrap_err();
            assert_eq!(err.kind(), kind);
        }
    }
}
