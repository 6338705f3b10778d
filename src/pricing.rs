use std::collections::BTreeMap;
use std::str::FromStr as _;

use crate::Result;
use crate::client::KrakenClient;
use crate::error::Error;
use crate::types::{Decimal, TickerInfo, TickerQuote};

impl KrakenClient {
    /// Best ask for `pair` from the public `Ticker` endpoint.
    pub async fn ask_price(&self, pair: &str) -> Result<Decimal> {
        let tickers: BTreeMap<String, TickerInfo> =
            self.public_call("Ticker", &[("pair", pair)]).await?;

        best_ask(pair, &tickers)
    }

    pub async fn quote(&self, pair: &str) -> Result<TickerQuote> {
        let ask = self.ask_price(pair).await?;
        tracing::debug!(pair, %ask, "quote");

        Ok(TickerQuote {
            pair: pair.to_owned(),
            ask,
        })
    }
}

// The result is keyed by Kraken's own pair name (e.g. `XXBTZEUR` for `XBTEUR`), so the
// first entry is taken rather than looking up `pair`.
fn best_ask(pair: &str, tickers: &BTreeMap<String, TickerInfo>) -> Result<Decimal> {
    let (_, ticker) = tickers
        .iter()
        .next()
        .ok_or_else(|| Error::price_unavailable(pair, "empty ticker result"))?;
    let raw = ticker
        .a
        .first()
        .ok_or_else(|| Error::price_unavailable(pair, "missing ask field"))?;

    let ask = Decimal::from_str(raw.trim())
        .map_err(|e| Error::price_unavailable(pair.to_owned(), format!("ask `{raw}`: {e}")))?;
    if ask <= Decimal::ZERO {
        return Err(Error::price_unavailable(
            pair.to_owned(),
            format!("ask `{raw}` is not positive"),
        ));
    }

    Ok(ask)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::Kind;

    fn tickers(json: &str) -> BTreeMap<String, TickerInfo> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn reads_first_ask() {
        let t = tickers(r#"{"XXBTZEUR":{"a":["60000.10000","1","1.000"],"b":["59999.9","2","2.000"]}}"#);

        assert_eq!(best_ask("XXBTZEUR", &t).unwrap(), dec!(60000.1));
    }

    #[test]
    fn empty_result_is_unavailable() {
        let err = best_ask("SOLEUR", &tickers("{}")).unwrap_err();

        assert_eq!(err.kind(), Kind::PriceUnavailable);
    }

    #[test]
    fn missing_or_bad_ask_is_unavailable() {
        for json in [
            r#"{"SOLEUR":{"b":["150.0","1","1"]}}"#,
            r#"{"SOLEUR":{"a":["n/a","1","1"]}}"#,
            r#"{"SOLEUR":{"a":["0.0","1","1"]}}"#,
            r#"{"SOLEUR":{"a":["-3","1","1"]}}"#,
        ] {
            let err = best_ask("SOLEUR", &tickers(json)).unwrap_err();
            assert_eq!(err.kind(), Kind::PriceUnavailable, "{json}");
        }
    }
}
