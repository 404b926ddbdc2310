/*
[INPUT]:  CLI arguments, YAML configuration file
[OUTPUT]: Wallet lifecycle, signing and transfer commands
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or startup flow
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use walletkit_cli::cli::coupons::{self, parse_coupon};
use walletkit_cli::cli::transfer::{self, EvmSend, SolanaSend};
use walletkit_cli::cli::wallet;
use walletkit_cli::{Session, WalletkitConfig};
use walletkit_core::Coupon;

#[derive(Parser, Debug)]
#[command(name = "walletkit", version, about = "Multi-chain HD wallet")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: String,
    /// Build and sign transactions without submitting them
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a wallet from a fresh recovery phrase
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 12)]
        words: usize,
    },
    /// Recover a wallet from a phrase (flag, prompt or stdin)
    Recover {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phrase: Option<String>,
    },
    List,
    Show {
        id: Option<Uuid>,
        /// Also print the recovery phrase
        #[arg(long)]
        reveal: bool,
    },
    Select {
        id: Uuid,
    },
    Delete {
        id: Uuid,
        #[arg(long)]
        yes: bool,
    },
    /// Derive an additional asset address
    AddAsset {
        symbol: String,
        #[arg(long)]
        wallet: Option<Uuid>,
        /// Explicit path, e.g. m/44'/60'/5'/0/0
        #[arg(long)]
        path: Option<String>,
    },
    /// Sign a backend auth challenge with the master key
    SignAuth {
        id: Option<Uuid>,
        #[arg(long)]
        nonce: Option<String>,
    },
    SendEvm {
        id: Option<Uuid>,
        #[arg(long, default_value = "ETH")]
        symbol: String,
        #[arg(long)]
        to: String,
        /// Decimal amount in the native unit
        #[arg(long)]
        value: String,
        #[arg(long)]
        gas_limit: Option<u64>,
        /// 0x-hex calldata
        #[arg(long)]
        data: Option<String>,
    },
    SendSol {
        id: Option<Uuid>,
        #[arg(long, default_value = "SOL")]
        symbol: String,
        #[arg(long)]
        to: String,
        /// Decimal SOL
        #[arg(long)]
        amount: String,
        /// Let the backend's fee payer cover the fee
        #[arg(long)]
        sponsored: bool,
    },
    /// Pick fee coupons for a required amount, smallest balances first
    Coupons {
        #[arg(long)]
        required: Decimal,
        #[arg(long = "coupon", value_name = "CODE=AMOUNT", value_parser = parse_coupon)]
        coupons: Vec<Coupon>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config_path = args.config_path.clone();
    let dry_run = args.dry_run;
    let open_session = || -> Result<Session> {
        let config = WalletkitConfig::load(config_path.as_deref()).context("load config")?;
        debug!(
            storage = %config.storage.path.display(),
            dry_run,
            "configuration loaded"
        );
        Session::open(config, dry_run)
    };

    match args.command {
        Command::Coupons { required, coupons: list } => coupons::run(required, &list),
        Command::Create { name, words } => wallet::create(&open_session()?, &name, words),
        Command::Recover { name, phrase } => wallet::recover(&open_session()?, &name, phrase),
        Command::List => wallet::list(&open_session()?),
        Command::Show { id, reveal } => wallet::show(&open_session()?, id, reveal),
        Command::Select { id } => wallet::select(&open_session()?, id),
        Command::Delete { id, yes } => wallet::delete(&open_session()?, id, yes),
        Command::AddAsset { symbol, wallet: id, path } => {
            wallet::add_asset(&open_session()?, id, &symbol, path.as_deref())
        }
        Command::SignAuth { id, nonce } => transfer::sign_auth(&open_session()?, id, nonce).await,
        Command::SendEvm {
            id,
            symbol,
            to,
            value,
            gas_limit,
            data,
        } => {
            let send = EvmSend {
                symbol,
                to,
                value,
                gas_limit,
                data,
            };
            transfer::send_evm(&open_session()?, id, send).await
        }
        Command::SendSol {
            id,
            symbol,
            to,
            amount,
            sponsored,
        } => {
            let send = SolanaSend {
                symbol,
                to,
                amount,
                sponsored,
            };
            transfer::send_sol(&open_session()?, id, send).await
        }
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}
