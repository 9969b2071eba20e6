//! Command line front end for the staking client.
//!
//! Reads go straight to the node. Writes are validated against live contract
//! state and printed as `near call` commands for the user to sign.

use {
    anyhow::{bail, Context, Result},
    async_trait::async_trait,
    chrono::Utc,
    clap::{Parser, Subcommand},
    nolan_common::{ClientConfig, FunctionCall, TransactionOutcome, WalletSession},
    nolan_rpc::NearRpcClient,
    nolan_staking::{StakingService, StakingSnapshot},
    std::{path::PathBuf, sync::Arc},
    tracing::{debug, info},
    tracing_subscriber::EnvFilter,
};

#[derive(Parser, Debug)]
#[command(
    name = "nolan-staking",
    about = "Inspect and manage token stakes on a NEAR staking contract",
    version
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "NOLAN_CONFIG")]
    config: Option<PathBuf>,

    /// Signed-in account to act as
    #[arg(long, env = "NEAR_ACCOUNT_ID")]
    account_id: Option<String>,

    /// Decimal places shown for amounts
    #[arg(long)]
    precision: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every stake held by an account
    Snapshot {
        /// Defaults to the signed-in account
        account: Option<String>,
    },

    /// Show the contract's hourly reward rate
    RewardRate,

    /// Show stakes and reward rate together
    Overview { account: Option<String> },

    /// Show storage registration on the token contract
    Storage { account: Option<String> },

    /// Show token balance
    Balance { account: Option<String> },

    /// Print the wallet sign-in link
    Login,

    /// Prepare a stake of AMOUNT tokens
    Stake { amount: String },

    /// Prepare a withdrawal of AMOUNT from stake INDEX
    Withdraw {
        amount: String,

        #[arg(long)]
        index: usize,
    },

    /// Prepare a storage registration for the signed-in account
    RegisterStorage,
}

/// Wallet session backed by a pre-authorised account id. Signing is left to
/// the user's own tooling.
struct CliWallet {
    account_id: Option<String>,
    wallet_url: String,
}

#[async_trait]
impl WalletSession for CliWallet {
    fn account_id(&self) -> Option<String> {
        self.account_id.clone()
    }

    fn request_sign_in(&self) {
        println!("Sign in at {}/login/?title=nolan-staking", self.wallet_url);
        println!("then rerun with --account-id <ACCOUNT> or NEAR_ACCOUNT_ID set.");
    }

    async fn sign_and_submit(&self, call: FunctionCall) -> nolan_common::Result<TransactionOutcome> {
        Err(nolan_common::Error::Wallet(format!(
            "no signing key available for {}.{}",
            call.receiver_id, call.method_name
        )))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid environment configuration")?;
    if let Some(precision) = cli.precision {
        config.session.display_precision = precision;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let view = NearRpcClient::new(&config.network, config.session.read_timeout())
        .context("Failed to create RPC client")?;
    info!(
        "Using {} node {} ({}; staking {}, token {})",
        config.network.network_id,
        view.rpc_url(),
        view.network().name(),
        config.contracts.staking_contract,
        config.contracts.token_contract
    );

    let wallet = CliWallet {
        account_id: cli.account_id.clone(),
        wallet_url: config.network.wallet_url.clone(),
    };
    let precision = config.session.display_precision;
    let service = StakingService::new(config, Arc::new(view), Arc::new(wallet));

    if let Command::Login = cli.command {
        service.request_sign_in();
        return Ok(());
    }

    service.connect().await.context(
        "Failed to start session; pass --account-id or run `nolan-staking login` first",
    )?;
    let signer = match service.account_id().await {
        Some(account) => account,
        None => bail!("Session has no account"),
    };
    debug!("Session ready for {}", signer);

    match cli.command {
        Command::Snapshot { account } => {
            let account = account.unwrap_or_else(|| signer.clone());
            let snapshot = service.fetch_snapshot(&account).await?;
            print_snapshot(&account, &snapshot, precision);
        }
        Command::RewardRate => {
            let rate = service.fetch_reward_per_hour().await?;
            println!("Reward per hour: {}", rate);
        }
        Command::Overview { account } => {
            let account = account.unwrap_or_else(|| signer.clone());
            let overview = service.fetch_overview(&account).await?;
            print_snapshot(&account, &overview.snapshot, precision);
            println!("Reward per hour: {}", overview.reward_per_hour);
        }
        Command::Storage { account } => {
            let account = account.unwrap_or_else(|| signer.clone());
            match service.fetch_storage_balance(&account).await? {
                Some(balance) if balance.is_registered() => println!(
                    "{} is registered (total {} NEAR, available {} NEAR)",
                    account,
                    balance.total.to_display_decimal(precision),
                    balance.available.to_display_decimal(precision)
                ),
                _ => println!("{} has no storage registered", account),
            }
        }
        Command::Balance { account } => {
            let account = account.unwrap_or_else(|| signer.clone());
            let balance = service.fetch_token_balance(&account).await?;
            println!("{}: {}", account, balance.to_display_decimal(precision));
        }
        Command::Stake { amount } => {
            let call = service.plan_stake(&amount).await?;
            print_call(&call, &signer);
        }
        Command::Withdraw { amount, index } => {
            // Withdrawals are checked against a fresh snapshot
            service.fetch_snapshot(&signer).await?;
            let call = service.plan_withdraw(&amount, index).await?;
            print_call(&call, &signer);
        }
        Command::RegisterStorage => {
            if service.is_storage_registered().await? {
                println!("{} already has storage registered", signer);
                return Ok(());
            }
            let call = service.plan_register_storage().await?;
            print_call(&call, &signer);
        }
        Command::Login => {}
    }

    service.disconnect().await;
    Ok(())
}

fn print_snapshot(account: &str, snapshot: &StakingSnapshot, precision: u32) {
    println!(
        "{}: {} stake(s), total claimable {}",
        account,
        snapshot.len(),
        snapshot.total_claimable().to_display_decimal(precision)
    );

    let now = Utc::now();
    for stake in snapshot.stakes() {
        let since = stake
            .since_display()
            .unwrap_or_else(|| stake.since_raw().to_string());
        println!(
            "  #{:<3} amount {:>20}  claimable {:>20}  since {} ({}h)",
            stake.index(),
            stake.display_amount(precision),
            stake.display_claimable(precision),
            since,
            stake.staked_for(now).num_hours()
        );
    }
}

fn print_call(call: &FunctionCall, signer: &str) {
    println!("Sign and submit with:");
    println!("  {}", call.to_near_cli(signer));
}
