//! Point-in-time valuation of the account in EUR and USD.
//!
//! Fiat balances are cross-converted with the rate implied by the two BTC quotes,
//! `usd_per_eur = btc_usd / btc_eur`. This tracks the real EUR/USD rate only as far as
//! the two BTC books agree.
//!
//! Products are exact in [`Decimal`]. The one division (`btc_usd / btc_eur`, and
//! `usd / usd_per_eur` for a USD balance) is rounded to 28 significant digits.
//! Figures are not rounded further here; [`Valuation`]'s `Display` shows 2 places.

use std::collections::BTreeMap;
use std::fmt;

use crate::Result;
use crate::error::Error;
use crate::types::{Asset, Balance, Decimal};

/// Best asks for every asset in both fiat currencies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Quotes {
    eur: BTreeMap<Asset, Decimal>,
    usd: BTreeMap<Asset, Decimal>,
}

impl Quotes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, asset: Asset, eur: Decimal, usd: Decimal) -> Self {
        self.insert(asset, eur, usd);
        self
    }

    pub fn insert(&mut self, asset: Asset, eur: Decimal, usd: Decimal) {
        self.eur.insert(asset, eur);
        self.usd.insert(asset, usd);
    }

    #[must_use]
    pub fn eur(&self, asset: Asset) -> Option<Decimal> {
        self.eur.get(&asset).copied()
    }

    #[must_use]
    pub fn usd(&self, asset: Asset) -> Option<Decimal> {
        self.usd.get(&asset).copied()
    }

    /// USD per EUR implied by the BTC quotes.
    pub fn usd_per_eur(&self) -> Result<Decimal> {
        let (Some(btc_usd), Some(btc_eur)) = (self.usd(Asset::Btc), self.eur(Asset::Btc)) else {
            return Err(Error::validation("BTC quotes are required for the EUR/USD rate"));
        };

        btc_usd
            .checked_div(btc_eur)
            .filter(|rate| *rate > Decimal::ZERO)
            .ok_or_else(|| Error::validation(format!("no EUR/USD rate from {btc_usd} / {btc_eur}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Holding {
    pub asset: Asset,
    pub amount: Decimal,
    pub value_eur: Decimal,
    pub value_usd: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Valuation {
    pub holdings: Vec<Holding>,
    pub eur: Decimal,
    pub usd: Decimal,
    pub usd_per_eur: Decimal,
    pub total_eur: Decimal,
    pub total_usd: Decimal,
}

impl Valuation {
    #[must_use]
    pub fn holding(&self, asset: Asset) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.asset == asset)
    }
}

/// Values `balance` at `quotes`. Assets without a quote are left out.
pub fn valuate(balance: &Balance, quotes: &Quotes) -> Result<Valuation> {
    let usd_per_eur = quotes.usd_per_eur()?;
    let eur = balance.eur();
    let usd = balance.usd();

    let holdings: Vec<Holding> = Asset::ALL
        .into_iter()
        .filter_map(|asset| {
            let amount = balance.get(asset.balance_code());
            let (ask_eur, ask_usd) = (quotes.eur(asset)?, quotes.usd(asset)?);
            Some(Holding {
                asset,
                amount,
                value_eur: amount * ask_eur,
                value_usd: amount * ask_usd,
            })
        })
        .collect();

    let crypto_eur: Decimal = holdings.iter().map(|h| h.value_eur).sum();
    let crypto_usd: Decimal = holdings.iter().map(|h| h.value_usd).sum();

    Ok(Valuation {
        holdings,
        eur,
        usd,
        usd_per_eur,
        total_eur: crypto_eur + eur + usd / usd_per_eur,
        total_usd: crypto_usd + usd + eur * usd_per_eur,
    })
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for h in &self.holdings {
            writeln!(
                f,
                "{:<4} {:>16}  €{:>12.2}  ${:>12.2}",
                h.asset, h.amount, h.value_eur, h.value_usd
            )?;
        }
        writeln!(f, "EUR  {:>16.2}", self.eur)?;
        if !self.usd.is_zero() {
            writeln!(f, "USD  {:>16.2}", self.usd)?;
        }
        write!(
            f,
            "Total €{:.2} / ${:.2} (USD/EUR {:.4})",
            self.total_eur, self.total_usd, self.usd_per_eur
        )
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::types::EUR;

    fn quotes() -> Quotes {
        Quotes::new()
            .with(Asset::Btc, dec!(60000), dec!(65000))
            .with(Asset::Sol, dec!(150), dec!(162.5))
    }

    #[test]
    fn totals_add_up_exactly() {
        let balance = Balance::from_iter([
            ("XXBT", dec!(0.01)),
            ("SOL", dec!(2.5)),
            (EUR, dec!(600)),
        ]);
        let quotes = quotes();

        let v = valuate(&balance, &quotes).unwrap();
        let btc = v.holding(Asset::Btc).unwrap();
        let sol = v.holding(Asset::Sol).unwrap();

        assert_eq!(btc.value_eur, dec!(600));
        assert_eq!(sol.value_usd, dec!(406.25));
        assert_eq!(v.total_eur, btc.value_eur + sol.value_eur + v.eur);
        assert_eq!(
            v.total_usd,
            btc.value_usd + sol.value_usd + v.eur * (dec!(65000) / dec!(60000))
        );
    }

    #[test]
    fn usd_balance_is_cross_converted() {
        let balance = Balance::from_iter([("ZUSD", dec!(130))]);
        let quotes = Quotes::new().with(Asset::Btc, dec!(100), dec!(130));

        let v = valuate(&balance, &quotes).unwrap();

        assert_eq!(v.usd_per_eur, dec!(1.3));
        assert_eq!(v.total_usd, dec!(130));
        assert_eq!(v.total_eur, dec!(100));
    }

    #[test]
    fn unquoted_asset_is_skipped() {
        let balance = Balance::from_iter([("SOL", dec!(3)), (EUR, dec!(10))]);
        let quotes = Quotes::new().with(Asset::Btc, dec!(60000), dec!(65000));

        let v = valuate(&balance, &quotes).unwrap();

        assert!(v.holding(Asset::Sol).is_none());
        assert_eq!(v.holding(Asset::Btc).unwrap().amount, Decimal::ZERO);
        assert_eq!(v.total_eur, dec!(10));
    }

    #[test]
    fn missing_btc_quote_is_an_error() {
        let quotes = Quotes::new().with(Asset::Sol, dec!(150), dec!(160));

        assert!(valuate(&Balance::default(), &quotes).is_err());
    }
}
