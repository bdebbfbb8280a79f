//! token-swap CLI.
//!
//! ```text
//! token-swap [--config FILE] [--rpc-url URL] [--chain-id N] <command>
//!
//!   balance    --token T [--owner ADDR]
//!   allowance  --token ADDR [--owner ADDR] [--spender ADDR]
//!   quote      --sell-token T --buy-token T --sell-amount N [--taker ADDR]
//!   swap       --sell-token T --buy-token T --sell-amount N [--no-wait]
//! ```
//!
//! Tokens are `ETH` or a contract address; amounts are in base units.
//! The private key is read from `SWAP_PRIVATE_KEY`.

use alloy::primitives::{Address, U256};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use token_swap::blockchain::{BlockchainClient, TokenRef, TxBuilder, Wallet};
use token_swap::config::validation::validate_config;
use token_swap::config::{load_or_default, ConfigError, SwapConfig};
use token_swap::observability::init_logging;
use token_swap::quoting::{QuoteClient, QuoteRequest};
use token_swap::swap::{SwapError, SwapExecutor, SwapPolicy, SwapRequest};

#[derive(Parser)]
#[command(name = "token-swap")]
#[command(about = "Swap tokens through a DEX quote API", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override blockchain.rpc_url
    #[arg(long)]
    rpc_url: Option<String>,

    /// Override blockchain.chain_id
    #[arg(long)]
    chain_id: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a token balance
    Balance {
        #[arg(long)]
        token: TokenRef,
        /// Defaults to the wallet address
        #[arg(long)]
        owner: Option<Address>,
    },
    /// Show the allowance an owner granted to a spender
    Allowance {
        #[arg(long)]
        token: Address,
        /// Defaults to the wallet address
        #[arg(long)]
        owner: Option<Address>,
        /// Defaults to swap.spender
        #[arg(long)]
        spender: Option<Address>,
    },
    /// Fetch a quote without sending anything
    Quote {
        #[command(flatten)]
        swap: SwapArgs,
        /// Defaults to the wallet address
        #[arg(long)]
        taker: Option<Address>,
    },
    /// Check balance, approve if needed, fetch a quote and submit it
    Swap {
        #[command(flatten)]
        swap: SwapArgs,
        /// Return as soon as the transaction is broadcast
        #[arg(long)]
        no_wait: bool,
    },
}

#[derive(Args)]
struct SwapArgs {
    #[arg(long)]
    sell_token: TokenRef,
    #[arg(long)]
    buy_token: TokenRef,
    /// Amount to sell, in base units
    #[arg(long, value_parser = parse_amount)]
    sell_amount: U256,
    /// Overrides swap.slippage_percentage (0.01 = 1%)
    #[arg(long)]
    slippage: Option<f64>,
}

impl SwapArgs {
    fn request(&self) -> SwapRequest {
        SwapRequest::new(self.sell_token, self.buy_token, self.sell_amount)
    }
}

fn parse_amount(s: &str) -> Result<U256, String> {
    U256::from_str_radix(s.trim().replace('_', "").as_str(), 10)
        .map_err(|e| format!("invalid amount '{}': {}", s, e))
}

fn resolve_config(cli: &Cli) -> Result<SwapConfig, ConfigError> {
    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(url) = &cli.rpc_url {
        config.blockchain.rpc_url = url.clone();
    }
    if let Some(id) = cli.chain_id {
        config.blockchain.chain_id = id;
    }
    if let Commands::Quote { swap, .. } | Commands::Swap { swap, .. } = &cli.command {
        if swap.slippage.is_some() {
            config.swap.slippage_percentage = swap.slippage;
        }
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn address_or_wallet(
    addr: Option<Address>,
    chain_id: u64,
) -> Result<Address, Box<dyn std::error::Error>> {
    match addr {
        Some(a) => Ok(a),
        None => Ok(Wallet::from_env(chain_id)?.address()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(&config.observability);

    tracing::info!(
        rpc_url = %config.blockchain.rpc_url,
        chain_id = config.blockchain.chain_id,
        quote_api = %config.api.base_url,
        "token-swap v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let chain_id = config.blockchain.chain_id;
    match cli.command {
        Commands::Balance { token, owner } => {
            let owner = address_or_wallet(owner, chain_id)?;
            let client = BlockchainClient::new(config.blockchain.clone()).await?;
            let balance = client.token_balance(token, owner).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "token": token.to_string(),
                    "owner": owner,
                    "balance": balance.to_string(),
                }))?
            );
        }
        Commands::Allowance { token, owner, spender } => {
            let owner = address_or_wallet(owner, chain_id)?;
            let spender = match spender {
                Some(s) => s,
                None => SwapPolicy::from_settings(&config.swap)?.spender,
            };
            let client = BlockchainClient::new(config.blockchain.clone()).await?;
            let allowance = client.token_allowance(token, owner, spender).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "token": token,
                    "owner": owner,
                    "spender": spender,
                    "allowance": allowance.to_string(),
                }))?
            );
        }
        Commands::Quote { swap, taker } => {
            let request = swap.request();
            request.validate()?;
            let taker = address_or_wallet(taker, chain_id)?;
            let quotes = QuoteClient::new(&config.api, config.retries.clone())?;
            let quote = quotes
                .get_quote(&QuoteRequest {
                    sell_token: request.sell_token,
                    buy_token: request.buy_token,
                    sell_amount: request.sell_amount,
                    taker,
                    slippage_percentage: config.swap.slippage_percentage,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Commands::Swap { swap, no_wait } => {
            let mut policy = SwapPolicy::from_settings(&config.swap)?;
            if no_wait {
                policy.wait_for_receipt = false;
            }

            let wallet = Wallet::from_env(chain_id)?;
            let client = BlockchainClient::new(config.blockchain.clone()).await?;
            let quotes = QuoteClient::new(&config.api, config.retries.clone())?;
            let executor = SwapExecutor::new(TxBuilder::new(client, wallet), quotes, policy);

            let receipt = match executor.execute(&swap.request()).await {
                Ok(r) => r,
                Err(e @ SwapError::InsufficientBalance { .. }) => {
                    eprintln!("ALERT: {}", e);
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            };

            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "tx_hash": receipt.tx_hash,
                    "approval_tx": receipt.approval_tx,
                    "sell_amount": receipt.sell_amount.to_string(),
                    "buy_amount": receipt.buy_amount.to_string(),
                    "status": format!("{:?}", receipt.status),
                }))?
            );
        }
    }

    Ok(())
}
