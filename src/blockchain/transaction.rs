//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build transactions with nonce, gas price and gas limit filled in
//! - Sign and broadcast transactions
//! - Monitor confirmations

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::erc20;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;

/// Gas overrides taken from an external source (e.g. a swap quote).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasHints {
    /// Gas limit to use instead of estimating.
    pub gas_limit: Option<u64>,
    /// Gas price in wei to use instead of the node's price.
    pub gas_price: Option<u128>,
}

/// Transaction builder for the taker wallet.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Wallet,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(client: BlockchainClient, wallet: Wallet) -> Self {
        Self { client, wallet }
    }

    /// Build a transaction request with nonce, gas price and gas limit.
    ///
    /// # Arguments
    /// * `to` - Destination address
    /// * `value` - Amount of native token to send
    /// * `data` - Call data (empty for simple transfers)
    /// * `hints` - Values that override the node's gas price and estimate
    pub async fn build(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
        hints: GasHints,
    ) -> BlockchainResult<TransactionRequest> {
        // Get current nonce from chain and sync wallet
        let chain_nonce = self.client.get_transaction_count(self.wallet.address()).await?;
        self.wallet.set_nonce(chain_nonce);

        let config = self.client.config();
        let gas_price = match hints.gas_price {
            Some(price) => price,
            None => {
                let node_price = self.client.get_gas_price().await?;
                (node_price as f64 * config.gas_price_multiplier) as u128
            }
        };

        let gas_price_gwei = gas_price / 1_000_000_000;
        if gas_price_gwei > config.max_gas_price_gwei as u128 {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: config.max_gas_price_gwei,
            });
        }

        let mut tx = TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(to)
            .with_value(value)
            .with_input(data)
            .with_gas_price(gas_price)
            .with_chain_id(self.wallet.chain_id());

        let gas_limit = match hints.gas_limit {
            Some(limit) => limit,
            None => self.client.estimate_gas(&tx).await?,
        };
        tx.set_gas_limit(gas_limit);
        tx.set_nonce(self.wallet.get_and_increment_nonce());

        Ok(tx)
    }

    /// Sign a built request and broadcast it.
    pub async fn send(&self, tx: TransactionRequest) -> BlockchainResult<TxHash> {
        let envelope = self.wallet.sign_transaction(tx).await?;
        let tx_hash = self.client.send_signed(envelope).await?;
        tracing::info!(tx_hash = %tx_hash, "Transaction broadcast");
        Ok(tx_hash)
    }

    /// Submit an ERC-20 `approve(spender, amount)` transaction.
    pub async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> BlockchainResult<TxHash> {
        let data = erc20::approve_calldata(spender, amount);
        let tx = self.build(token, U256::ZERO, data, GasHints::default()).await?;
        tracing::info!(token = %token, spender = %spender, amount = %amount, "Submitting approval");
        self.send(tx).await
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// # Arguments
    /// * `tx_hash` - Transaction hash to monitor
    /// * `timeout_secs` - Maximum time to wait for confirmation
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout_secs: u64,
    ) -> BlockchainResult<ConfirmationStatus> {
        let required_confirmations = self.client.confirmation_blocks().max(1);
        let timeout_duration = Duration::from_secs(timeout_secs);
        let poll_interval = Duration::from_secs(2);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.client.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Ok(ConfirmationStatus::Failed(format!(
                        "Transaction {} reverted",
                        tx_hash
                    )));
                }

                // The inclusion block counts as the first confirmation
                let current_block = self.client.get_block_number().await?;
                let tx_block = receipt.block_number.unwrap_or(current_block);
                let confirmations = current_block.saturating_sub(tx_block) as u32 + 1;

                if confirmations >= required_confirmations {
                    return Ok(ConfirmationStatus::Confirmed {
                        block_number: tx_block,
                    });
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::ConfirmationTimeout {
                tx_hash,
                secs: timeout_secs,
            }),
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Chain ID the wallet signs for.
    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    pub fn client(&self) -> &BlockchainClient {
        &self.client
    }
}
