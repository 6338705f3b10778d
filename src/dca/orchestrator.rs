use std::fmt;

use crate::Result;
use crate::client::KrakenClient;
use crate::dca::config::{DcaConfig, DefaultAmounts};
use crate::dca::console::{Console, is_affirmative, parse_amount};
use crate::dca::policy::{AmountPolicy, ConfirmPolicy, DcaPolicies};
use crate::error::Error;
use crate::portfolio::{Quotes, Valuation, valuate};
use crate::types::{Asset, Decimal, OrderResult};

/// Progress of a run. Stages only move forward; `Aborted` and `Reported` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    PricesFetched,
    CredentialsChecked,
    BalanceFetched,
    FundsVerified,
    UserConfirmed,
    OrdersPlaced,
    Reported,
    Aborted,
}

/// Why a run stopped before placing orders.
#[derive(Debug)]
pub enum AbortReason {
    QuoteFailed { pair: String, error: Error },
    InvalidCredentials,
    BalanceFailed(Error),
    ValuationFailed(Error),
    Console(Error),
    InvalidInput { asset: Asset, error: Error },
    NothingToBuy,
    InsufficientFunds { available: Decimal, required: Decimal },
    Declined,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::QuoteFailed { pair, error } => {
                write!(f, "could not fetch price for {pair}: {error}")
            }
            AbortReason::InvalidCredentials => {
                write!(f, "API credentials were rejected, check KRAKEN_API_KEY/KRAKEN_API_SECRET")
            }
            AbortReason::BalanceFailed(error) => write!(f, "failed to get balance: {error}"),
            AbortReason::ValuationFailed(error) => write!(f, "could not value portfolio: {error}"),
            AbortReason::Console(error) => write!(f, "console input failed: {error}"),
            AbortReason::InvalidInput { asset, error } => {
                write!(f, "invalid {asset} amount: {error}")
            }
            AbortReason::NothingToBuy => write!(f, "both amounts are zero, nothing to buy"),
            AbortReason::InsufficientFunds {
                available,
                required,
            } => write!(
                f,
                "not enough EUR: need €{required:.2}, have €{available:.2}"
            ),
            AbortReason::Declined => write!(f, "orders declined"),
        }
    }
}

/// One attempted market buy.
#[derive(Debug)]
pub struct OrderAttempt {
    pub asset: Asset,
    pub pair: String,
    pub amount_eur: Decimal,
    pub result: Result<OrderResult>,
}

impl fmt::Display for OrderAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(order) if order.txid.is_empty() => write!(
                f,
                "{} €{:.2}: validated `{}`",
                self.asset, self.amount_eur, order.descr.order
            ),
            Ok(order) => write!(
                f,
                "{} €{:.2}: `{}` txid {}",
                self.asset,
                self.amount_eur,
                order.descr.order,
                order.txid.join(",")
            ),
            Err(e) => write!(f, "{} €{:.2}: failed, {e}", self.asset, self.amount_eur),
        }
    }
}

/// Outcome of a run that reached the order stage.
#[derive(Debug)]
pub struct Report {
    pub before: Valuation,
    pub orders: Vec<OrderAttempt>,
    /// `None` when the balance could not be fetched again after ordering.
    pub after: Option<Valuation>,
}

#[derive(Debug)]
pub enum Outcome {
    Reported(Report),
    Aborted { stage: Stage, reason: AbortReason },
}

impl Outcome {
    #[must_use]
    pub fn is_reported(&self) -> bool {
        matches!(self, Outcome::Reported(_))
    }
}

/// Drives one DCA run: prices, credentials, balance, amounts, funds, confirmation, orders.
pub struct Orchestrator<C> {
    client: KrakenClient,
    amounts: DefaultAmounts,
    policies: DcaPolicies,
    console: C,
    stage: Stage,
}

impl<C: Console> Orchestrator<C> {
    #[must_use]
    pub fn new(client: KrakenClient, config: &DcaConfig, console: C) -> Self {
        Self {
            client,
            amounts: config.amounts,
            policies: config.policies,
            console,
            stage: Stage::Init,
        }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn console(&self) -> &C {
        &self.console
    }

    pub async fn run(&mut self) -> Outcome {
        match self.execute().await {
            Ok(report) => {
                self.advance(Stage::Reported);
                Outcome::Reported(report)
            }
            Err(reason) => {
                let stage = self.stage;
                tracing::warn!(?stage, %reason, "run aborted");
                self.console.show(&format!("Aborted: {reason}"));
                self.stage = Stage::Aborted;
                Outcome::Aborted { stage, reason }
            }
        }
    }

    async fn execute(&mut self) -> std::result::Result<Report, AbortReason> {
        let quotes = self.fetch_quotes().await?;
        self.advance(Stage::PricesFetched);

        if !self.client.test_credentials().await {
            return Err(AbortReason::InvalidCredentials);
        }
        self.advance(Stage::CredentialsChecked);

        let balance = self
            .client
            .balance()
            .await
            .map_err(AbortReason::BalanceFailed)?;
        self.advance(Stage::BalanceFetched);

        let before = valuate(&balance, &quotes).map_err(AbortReason::ValuationFailed)?;
        self.console.show(&format!("Current portfolio:\n{before}"));

        let requested = self.request_amounts().await?;
        let required = total_of(&requested)?;
        if required.is_zero() {
            return Err(AbortReason::NothingToBuy);
        }

        let available = balance.eur();
        if available < required {
            return Err(AbortReason::InsufficientFunds {
                available,
                required,
            });
        }
        self.advance(Stage::FundsVerified);

        self.confirm(&requested, required, available).await?;
        self.advance(Stage::UserConfirmed);

        let orders = self.place_orders(&requested).await;
        self.advance(Stage::OrdersPlaced);

        let after = match self.client.balance().await {
            Ok(balance) => match valuate(&balance, &quotes) {
                Ok(valuation) => Some(valuation),
                Err(e) => {
                    tracing::warn!(error = %e, "could not value updated balance");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch updated balance");
                None
            }
        };
        match &after {
            Some(valuation) => self
                .console
                .show(&format!("Updated portfolio:\n{valuation}")),
            None => self.console.show("Updated balance unavailable"),
        }

        Ok(Report {
            before,
            orders,
            after,
        })
    }

    /// Best asks for every asset in EUR then USD, one request at a time.
    async fn fetch_quotes(&self) -> std::result::Result<Quotes, AbortReason> {
        let mut quotes = Quotes::new();
        for asset in Asset::ALL {
            let eur = self.ask(asset.eur_pair()).await?;
            let usd = self.ask(asset.usd_pair()).await?;
            quotes.insert(asset, eur, usd);
        }

        Ok(quotes)
    }

    async fn ask(&self, pair: &str) -> std::result::Result<Decimal, AbortReason> {
        self.client
            .ask_price(pair)
            .await
            .map_err(|error| AbortReason::QuoteFailed {
                pair: pair.to_owned(),
                error,
            })
    }

    async fn request_amounts(&mut self) -> std::result::Result<Vec<(Asset, Decimal)>, AbortReason> {
        let mut requested = Vec::with_capacity(Asset::ALL.len());
        for asset in Asset::ALL {
            let default = self.amounts.get(asset);
            let amount = match self.policies.amounts {
                AmountPolicy::Defaults => default,
                AmountPolicy::Prompt => {
                    let answer = self
                        .console
                        .prompt(&format!("{asset} amount in EUR [{default}] (0 to skip): "))
                        .await
                        .map_err(AbortReason::Console)?;
                    parse_amount(&answer, default)
                        .map_err(|error| AbortReason::InvalidInput { asset, error })?
                }
            };
            requested.push((asset, amount));
        }

        Ok(requested)
    }

    async fn confirm(
        &mut self,
        requested: &[(Asset, Decimal)],
        required: Decimal,
        available: Decimal,
    ) -> std::result::Result<(), AbortReason> {
        let plan = requested
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(asset, amount)| format!("€{amount:.2} of {asset}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mode = if self.policies.validate_only {
            " (validate only)"
        } else {
            ""
        };
        self.console.show(&format!(
            "Buying {plan}{mode}: total €{required:.2} of €{available:.2} available"
        ));

        match self.policies.confirm {
            ConfirmPolicy::AssumeYes => Ok(()),
            ConfirmPolicy::Prompt => {
                let answer = self
                    .console
                    .prompt("Place these orders? [y/N]: ")
                    .await
                    .map_err(AbortReason::Console)?;
                if is_affirmative(&answer) {
                    Ok(())
                } else {
                    Err(AbortReason::Declined)
                }
            }
        }
    }

    /// Places each non-zero buy in order. A failed order does not stop the next one.
    async fn place_orders(&mut self, requested: &[(Asset, Decimal)]) -> Vec<OrderAttempt> {
        let mut attempts = Vec::new();
        for &(asset, amount_eur) in requested {
            if amount_eur.is_zero() {
                continue;
            }

            let pair = asset.eur_pair();
            let result = self
                .client
                .buy_with_fiat(pair, amount_eur, self.policies.validate_only)
                .await;
            if let Err(e) = &result {
                tracing::error!(%asset, pair, error = %e, "order failed");
            }

            let attempt = OrderAttempt {
                asset,
                pair: pair.to_owned(),
                amount_eur,
                result,
            };
            self.console.show(&attempt.to_string());
            attempts.push(attempt);
        }

        attempts
    }

    fn advance(&mut self, stage: Stage) {
        tracing::debug!(from = ?self.stage, to = ?stage, "stage");
        self.stage = stage;
    }
}

/// Sum of the requested amounts. An overflowing sum is blamed on the asset that tipped it.
fn total_of(requested: &[(Asset, Decimal)]) -> std::result::Result<Decimal, AbortReason> {
    requested
        .iter()
        .try_fold(Decimal::ZERO, |total, &(asset, amount)| {
            total
                .checked_add(amount)
                .ok_or_else(|| AbortReason::InvalidInput {
                    asset,
                    error: Error::validation(format!(
                        "€{amount} on top of €{total} exceeds the largest representable amount"
                    )),
                })
        })
}
