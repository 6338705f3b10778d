//! One dollar-cost averaging run.
//!
//! The run is a forward-only sequence of [`Stage`]s:
//! - fetch BTC and SOL asks in EUR and USD
//! - check credentials, fetch the balance and show its valuation
//! - choose per-asset EUR amounts, check funds, confirm
//! - place market buys (BTC then SOL) and report the updated valuation
//!
//! Any failure before the orders ends the run as [`Outcome::Aborted`] with no orders sent.

mod config;
mod console;
mod orchestrator;
mod policy;

pub use config::{DEFAULT_AMOUNT_EUR, DcaConfig, DefaultAmounts, RawDcaConfig};
pub use console::{Console, StdConsole, is_affirmative, parse_amount};
pub use orchestrator::{AbortReason, OrderAttempt, Orchestrator, Outcome, Report, Stage};
pub use policy::{AmountPolicy, ConfirmPolicy, DcaPolicies};
