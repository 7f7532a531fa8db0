use crate::{
    amount::AmountError,
    provider::ProviderError,
    view::{
        Action,
        RoundPhase,
    },
};
use alloy_primitives::B256;

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no wallet provider detected")]
    ProviderMissing,
    #[error("{0} is not supported")]
    UnsupportedWallet(String),
    #[error("wrong network: expected chain {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("wallet returned no accounts")]
    NoAccounts,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("invalid amount {input:?}")]
    InvalidAmount {
        input: String,
        #[source]
        source: Option<AmountError>,
    },
    #[error("invalid choice {0}")]
    InvalidChoice(String),
    #[error("{0} is already in progress")]
    Busy(Action),
    #[error("cannot move round from {from:?} to {to:?}")]
    InvalidTransition { from: RoundPhase, to: RoundPhase },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to decode {method} result: {reason}")]
    Decode { method: &'static str, reason: String },
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("no receipt for transaction {hash} after {attempts} attempts")]
    ReceiptTimeout { hash: B256, attempts: u32 },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl GatewayError {
    pub fn invalid_amount(input: impl Into<String>) -> Self {
        GatewayError::InvalidAmount {
            input: input.into(),
            source: None,
        }
    }

    /// True for failures reported by the wallet or the chain rather than by
    /// local guards.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GatewayError::Provider(_)
                | GatewayError::Reverted(_)
                | GatewayError::ReceiptTimeout { .. }
                | GatewayError::Decode { .. }
        )
    }
}
