use anyhow::Context as _;
use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use kraken_dca::KRAKEN;
use kraken_dca::dca::{DcaConfig, DcaPolicies, Orchestrator, Outcome, RawDcaConfig, StdConsole};

#[derive(Parser, Debug)]
#[command(name = "kraken-dca")]
#[command(about = "Buy BTC and SOL with EUR on Kraken", long_about = None)]
struct Args {
    /// Kraken API key
    #[arg(long, env = "KRAKEN_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Kraken API secret, base64 encoded
    #[arg(long, env = "KRAKEN_API_SECRET", hide_env_values = true)]
    api_secret: String,

    /// REST API host
    #[arg(long, env = "KRAKEN_API_URL", default_value = KRAKEN)]
    api_url: String,

    /// Default EUR to spend on BTC
    #[arg(long, env = "DCA_BTC_AMOUNT_EUR")]
    btc_eur: Option<String>,

    /// Default EUR to spend on SOL
    #[arg(long, env = "DCA_SOL_AMOUNT_EUR")]
    sol_eur: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, env = "KRAKEN_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Use the default amounts and skip the confirmation prompt
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,

    /// Have the exchange validate orders without executing them
    #[arg(long, default_value_t = false)]
    validate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let policies = if args.yes {
        DcaPolicies::unattended()
    } else {
        DcaPolicies::interactive()
    }
    .with_validate_only(args.validate_only);

    let raw = RawDcaConfig {
        api_key: args.api_key,
        api_secret: SecretString::from(args.api_secret),
        host: Some(args.api_url),
        btc_amount_eur: args.btc_eur,
        sol_amount_eur: args.sol_eur,
        timeout_secs: args.timeout_secs,
    };
    let config = DcaConfig::from_raw(raw, policies).context("invalid configuration")?;
    let client = config.client().context("failed to build HTTP client")?;

    tracing::info!(
        host = %config.host,
        btc_eur = %config.amounts.btc,
        sol_eur = %config.amounts.sol,
        unattended = args.yes,
        validate_only = args.validate_only,
        "starting DCA run"
    );

    let mut orchestrator = Orchestrator::new(client, &config, StdConsole::new());
    match orchestrator.run().await {
        Outcome::Reported(report) => {
            let failed = report.orders.iter().filter(|o| o.result.is_err()).count();
            tracing::info!(
                orders = report.orders.len(),
                failed,
                "DCA run finished"
            );
        }
        Outcome::Aborted { stage, reason } => {
            tracing::info!(?stage, %reason, "DCA run aborted");
        }
    }

    Ok(())
}
