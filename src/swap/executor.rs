//! The swap workflow: balance, allowance, quote, submit.
//!
//! # Order of operations
//! ```text
//! balance(sell token) ── too low ──▶ InsufficientBalance (nothing else runs)
//!     │
//! allowance(spender) ── too low ──▶ approve + wait for it to be mined
//!     │
//! GET quote
//!     │
//! allowance(quote.allowanceTarget), only if it differs from the spender
//!     │
//! submit quote transaction ──▶ optional wait for receipt
//! ```

use alloy::primitives::{Address, Bytes, TxHash, U256};

use crate::blockchain::{
    BlockchainError, BlockchainResult, ConfirmationStatus, GasHints, TokenRef, TxBuilder,
};
use crate::quoting::{Quote, QuoteClient, QuoteRequest, QuoteResult};
use crate::swap::types::{SwapError, SwapPolicy, SwapReceipt, SwapRequest};

/// Chain operations the workflow needs from the taker's side.
#[allow(async_fn_in_trait)]
pub trait ChainAccess {
    /// Address that sells, approves and signs.
    fn taker(&self) -> Address;

    /// Chain ID transactions are signed for.
    fn chain_id(&self) -> u64;

    async fn balance(&self, token: TokenRef) -> BlockchainResult<U256>;

    async fn allowance(&self, token: Address, spender: Address) -> BlockchainResult<U256>;

    async fn approve(&self, token: Address, spender: Address, amount: U256)
        -> BlockchainResult<TxHash>;

    async fn submit(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
        gas: GasHints,
    ) -> BlockchainResult<TxHash>;

    async fn wait(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus>;
}

/// Anything that can price a swap and hand back a transaction.
#[allow(async_fn_in_trait)]
pub trait QuoteSource {
    async fn quote(&self, request: &QuoteRequest) -> QuoteResult<Quote>;
}

impl ChainAccess for TxBuilder {
    fn taker(&self) -> Address {
        self.address()
    }

    fn chain_id(&self) -> u64 {
        TxBuilder::chain_id(self)
    }

    async fn balance(&self, token: TokenRef) -> BlockchainResult<U256> {
        self.client().token_balance(token, self.address()).await
    }

    async fn allowance(&self, token: Address, spender: Address) -> BlockchainResult<U256> {
        self.client()
            .token_allowance(token, self.address(), spender)
            .await
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> BlockchainResult<TxHash> {
        TxBuilder::approve(self, token, spender, amount).await
    }

    async fn submit(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
        gas: GasHints,
    ) -> BlockchainResult<TxHash> {
        let tx = self.build(to, value, data, gas).await?;
        self.send(tx).await
    }

    async fn wait(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        let secs = self.client().config().confirmation_timeout_secs;
        self.wait_for_confirmation(tx_hash, secs).await
    }
}

impl QuoteSource for QuoteClient {
    async fn quote(&self, request: &QuoteRequest) -> QuoteResult<Quote> {
        self.get_quote(request).await
    }
}

/// Runs swaps for one taker.
#[derive(Debug)]
pub struct SwapExecutor<C, Q> {
    chain: C,
    quotes: Q,
    policy: SwapPolicy,
}

impl<C: ChainAccess, Q: QuoteSource> SwapExecutor<C, Q> {
    pub fn new(chain: C, quotes: Q, policy: SwapPolicy) -> Self {
        Self {
            chain,
            quotes,
            policy,
        }
    }

    /// Execute the full workflow for one swap.
    pub async fn execute(&self, request: &SwapRequest) -> Result<SwapReceipt, SwapError> {
        request.validate()?;
        let taker = self.chain.taker();
        tracing::info!(
            taker = %taker,
            sell_token = %request.sell_token,
            buy_token = %request.buy_token,
            sell_amount = %request.sell_amount,
            "Starting swap"
        );

        // 1. Balance
        self.check_balance(request).await?;

        // 2. Allowance for the configured spender
        let mut approval_tx = None;
        if let TokenRef::Erc20(token) = request.sell_token {
            approval_tx = self
                .ensure_allowance(token, self.policy.spender, request.sell_amount)
                .await?;
        }

        // 3. Quote
        let quote = self.quotes.quote(&self.quote_request(request)).await?;
        self.check_quote_chain(&quote)?;

        if let (TokenRef::Erc20(token), Some(target)) = (request.sell_token, quote.spender()) {
            if target != self.policy.spender {
                tracing::warn!(
                    configured = %self.policy.spender,
                    allowance_target = %target,
                    "Quote names a different allowance target"
                );
                if let Some(hash) = self
                    .ensure_allowance(token, target, request.sell_amount)
                    .await?
                {
                    approval_tx = Some(hash);
                }
            }
        }

        // 4. Submit
        let tx_hash = self
            .chain
            .submit(quote.to, quote.value, quote.data.clone(), quote.gas_hints())
            .await?;

        let status = if self.policy.wait_for_receipt {
            self.chain.wait(tx_hash).await?
        } else {
            ConfirmationStatus::Pending
        };

        match &status {
            ConfirmationStatus::Failed(reason) => {
                tracing::error!(tx_hash = %tx_hash, reason = %reason, "Swap transaction failed");
            }
            _ => tracing::info!(tx_hash = %tx_hash, status = ?status, "Swap submitted"),
        }

        Ok(SwapReceipt {
            tx_hash,
            approval_tx,
            sell_amount: quote.sell_amount,
            buy_amount: quote.buy_amount,
            status,
        })
    }

    fn quote_request(&self, request: &SwapRequest) -> QuoteRequest {
        QuoteRequest {
            sell_token: request.sell_token,
            buy_token: request.buy_token,
            sell_amount: request.sell_amount,
            taker: self.chain.taker(),
            slippage_percentage: self.policy.slippage_percentage,
        }
    }

    /// A quote routed on another chain must never be signed for this one.
    fn check_quote_chain(&self, quote: &Quote) -> Result<(), SwapError> {
        let signer = self.chain.chain_id();
        match quote.chain_id {
            Some(quoted) if quoted != signer => {
                tracing::error!(
                    quote_chain_id = quoted,
                    signer_chain_id = signer,
                    "Quote is for a different chain"
                );
                Err(SwapError::QuoteChainMismatch { quoted, signer })
            }
            _ => Ok(()),
        }
    }

    async fn check_balance(&self, request: &SwapRequest) -> Result<(), SwapError> {
        let available = self.chain.balance(request.sell_token).await?;
        if available < request.sell_amount {
            tracing::warn!(
                token = %request.sell_token,
                required = %request.sell_amount,
                available = %available,
                "Insufficient balance for swap"
            );
            return Err(SwapError::InsufficientBalance {
                token: request.sell_token,
                required: request.sell_amount,
                available,
            });
        }
        Ok(())
    }

    /// Approve `spender` when its allowance is below `needed`; waits for the approval.
    async fn ensure_allowance(
        &self,
        token: Address,
        spender: Address,
        needed: U256,
    ) -> Result<Option<TxHash>, SwapError> {
        let current = self.chain.allowance(token, spender).await?;
        if current >= needed {
            tracing::debug!(
                token = %token,
                spender = %spender,
                allowance = %current,
                "Allowance sufficient"
            );
            return Ok(None);
        }

        let amount = self.policy.approval_amount(needed);
        let hash = self.chain.approve(token, spender, amount).await?;
        match self.chain.wait(hash).await? {
            ConfirmationStatus::Failed(_) => Err(BlockchainError::Reverted(hash).into()),
            _ => Ok(Some(hash)),
        }
    }
}
