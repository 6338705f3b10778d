use std::collections::BTreeMap;

use bon::Builder;
use serde::Deserialize;
use strum_macros::{AsRefStr, Display};

pub use rust_decimal::Decimal;

/// Fractional digits Kraken accepts for BTC and SOL order volumes.
pub const VOLUME_SCALE: u32 = 8;

pub const EUR: &str = "ZEUR";
pub const USD: &str = "ZUSD";

/// Crypto assets this tool accumulates.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Asset {
    #[strum(serialize = "BTC")]
    Btc,
    #[strum(serialize = "SOL")]
    Sol,
}

impl Asset {
    /// Assets in the order orders are placed.
    pub const ALL: [Asset; 2] = [Asset::Btc, Asset::Sol];

    /// Balance key used by the `Balance` endpoint.
    #[must_use]
    pub const fn balance_code(self) -> &'static str {
        match self {
            Asset::Btc => "XXBT",
            Asset::Sol => "SOL",
        }
    }

    #[must_use]
    pub const fn eur_pair(self) -> &'static str {
        match self {
            Asset::Btc => "XXBTZEUR",
            Asset::Sol => "SOLEUR",
        }
    }

    #[must_use]
    pub const fn usd_pair(self) -> &'static str {
        match self {
            Asset::Btc => "XXBTZUSD",
            Asset::Sol => "SOLUSD",
        }
    }
}

/// Kraken `type` field. Only buys are placed.
#[derive(Clone, Copy, Debug, Display, AsRefStr, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Buy,
}

/// Kraken `ordertype` field. Only market orders are placed.
#[derive(Clone, Copy, Debug, Display, AsRefStr, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum OrderType {
    Market,
}

/// Account balances keyed by Kraken asset code.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Balance(BTreeMap<String, Decimal>);

impl Balance {
    /// Amount held of `code`; absent assets read as zero.
    #[must_use]
    pub fn get(&self, code: &str) -> Decimal {
        self.0.get(code).copied().unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn eur(&self) -> Decimal {
        self.get(EUR)
    }

    #[must_use]
    pub fn usd(&self) -> Decimal {
        self.get(USD)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, Decimal)> for Balance {
    fn from_iter<I: IntoIterator<Item = (K, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One entry of the `Ticker` result. Only the best ask is read.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct TickerInfo {
    /// `[price, whole lot volume, lot volume]`
    #[serde(default)]
    pub(crate) a: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickerQuote {
    pub pair: String,
    pub ask: Decimal,
}

/// Market buy submitted through `AddOrder`.
#[derive(Clone, Debug, Builder, PartialEq, Eq)]
pub struct MarketOrder {
    #[builder(into)]
    pub pair: String,
    pub volume: Decimal,
    /// Ask the exchange to validate the order without executing it.
    #[builder(default)]
    pub validate: bool,
}

impl MarketOrder {
    /// Form parameters in the order they are signed and sent.
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("pair", self.pair.clone()),
            ("type", Side::Buy.to_string()),
            ("ordertype", OrderType::Market.to_string()),
            ("volume", format_volume(self.volume)),
        ];
        if self.validate {
            params.push(("validate", "true".to_owned()));
        }
        params
    }
}

/// Renders a volume with exactly [`VOLUME_SCALE`] fractional digits.
#[must_use]
pub fn format_volume(volume: Decimal) -> String {
    let mut v = volume.trunc_with_scale(VOLUME_SCALE);
    v.rescale(VOLUME_SCALE);
    v.to_string()
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct OrderDescription {
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub close: Option<String>,
}

/// Result of `AddOrder`, as returned by the exchange.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct OrderResult {
    #[serde(default)]
    pub descr: OrderDescription,
    /// Empty when the order was only validated.
    #[serde(default)]
    pub txid: Vec<String>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn balance_reads_missing_as_zero() {
        let balance: Balance =
            serde_json::from_str(r#"{"ZEUR":"600.0000","XXBT":"0.0100000000"}"#).unwrap();

        assert_eq!(balance.eur(), dec!(600));
        assert_eq!(balance.get(Asset::Btc.balance_code()), dec!(0.01));
        assert_eq!(balance.get(Asset::Sol.balance_code()), Decimal::ZERO);
        assert_eq!(balance.usd(), Decimal::ZERO);
    }

    #[test]
    fn volume_is_padded_to_eight_places() {
        assert_eq!(format_volume(dec!(0.5)), "0.50000000");
        assert_eq!(format_volume(dec!(0.004166666666)), "0.00416666");
    }

    #[test]
    fn market_order_params_keep_insertion_order() {
        let order = MarketOrder::builder()
            .pair("SOLEUR")
            .volume(dec!(1.25))
            .validate(true)
            .build();

        let keys: Vec<_> = order.params().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["pair", "type", "ordertype", "volume", "validate"]);
        assert_eq!(order.params()[1].1, "buy");
        assert_eq!(order.params()[2].1, "market");
    }

    #[test]
    fn order_result_deserializes() {
        let result: OrderResult = serde_json::from_str(
            r#"{"descr":{"order":"buy 0.00416666 XBTEUR @ market"},"txid":["OUF4EM-FRGI2-MQMWZD"]}"#,
        )
        .unwrap();

        assert_eq!(result.txid, ["OUF4EM-FRGI2-MQMWZD"]);
        assert_eq!(result.descr.order, "buy 0.00416666 XBTEUR @ market");
    }
}
