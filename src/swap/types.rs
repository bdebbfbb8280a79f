//! Swap workflow types.

use alloy::primitives::{Address, TxHash, U256};
use thiserror::Error;

use crate::blockchain::{BlockchainError, ConfirmationStatus, TokenRef};
use crate::config::{ApprovalMode, SwapSettings};
use crate::quoting::QuoteError;

/// What the user wants to swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub sell_token: TokenRef,
    pub buy_token: TokenRef,
    /// Amount of the sell token, in its base units.
    pub sell_amount: U256,
}

impl SwapRequest {
    pub fn new(sell_token: TokenRef, buy_token: TokenRef, sell_amount: U256) -> Self {
        Self {
            sell_token,
            buy_token,
            sell_amount,
        }
    }

    /// Reject requests that can never produce a meaningful swap.
    pub fn validate(&self) -> Result<(), SwapError> {
        if self.sell_amount.is_zero() {
            return Err(SwapError::InvalidRequest("sell amount must be > 0".into()));
        }
        if self.sell_token == self.buy_token {
            return Err(SwapError::InvalidRequest(
                "sell and buy token are the same".into(),
            ));
        }
        Ok(())
    }
}

/// Swap settings resolved into typed values.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapPolicy {
    /// Contract approved to pull the sell token before quoting.
    pub spender: Address,
    pub approval: ApprovalMode,
    pub slippage_percentage: Option<f64>,
    pub wait_for_receipt: bool,
}

impl SwapPolicy {
    pub fn from_settings(settings: &SwapSettings) -> Result<Self, SwapError> {
        let spender = settings
            .spender
            .parse::<Address>()
            .map_err(|e| SwapError::InvalidRequest(format!("invalid spender: {}", e)))?;
        Ok(Self {
            spender,
            approval: settings.approval,
            slippage_percentage: settings.slippage_percentage,
            wait_for_receipt: settings.wait_for_receipt,
        })
    }

    /// Allowance to request when the current one is too low.
    pub fn approval_amount(&self, needed: U256) -> U256 {
        match self.approval {
            ApprovalMode::Exact => needed,
            ApprovalMode::Unlimited => U256::MAX,
        }
    }
}

/// Outcome of a submitted swap.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapReceipt {
    /// Hash of the swap transaction.
    pub tx_hash: TxHash,
    /// Hash of the approval sent first, if one was needed.
    pub approval_tx: Option<TxHash>,
    pub sell_amount: U256,
    /// Buy amount promised by the quote.
    pub buy_amount: U256,
    pub status: ConfirmationStatus,
}

/// Errors from the swap workflow.
#[derive(Debug, Error)]
pub enum SwapError {
    /// The taker does not hold enough of the sell token.
    #[error("Insufficient balance of {token}: need {required}, have {available}")]
    InsufficientBalance {
        token: TokenRef,
        required: U256,
        available: U256,
    },

    /// The quote was built for a different chain than the signer's.
    #[error("Quote is for chain {quoted} but transactions are signed for chain {signer}")]
    QuoteChainMismatch { quoted: u64, signer: u64 },

    #[error("Invalid swap request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error(transparent)]
    Quote(#[from] QuoteError),
}
