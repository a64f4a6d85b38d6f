use std::path::PathBuf;

pub use alloy_primitives;
use alloy_primitives::Address;
use alloy_provider::PendingTransactionError;
use alloy_signer_local::LocalSignerError;
use alloy_transport::TransportError;
pub use connection::Connection;
pub use receipt::{MultisigOutcome, ReceiptSummary};
pub use signing::SigningPolicy;
pub use types::*;

pub mod abi;
mod connection;
pub mod eip1077;
pub mod providers;
pub mod receipt;
pub mod signing;
mod types;

/// Errors that can occur when talking to the node or to one of the OpenST contracts.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Couldn't create connection: {0:?}")]
    ProviderError(TransportError),
    #[error("RPC request failed: {0}")]
    Rpc(TransportError),
    #[error("Transaction rejected: the sender nonce is already used")]
    SignerConflict,
    #[error("Couldn't track the transaction: {0}")]
    WatchError(#[from] PendingTransactionError),
    #[error("Failed to decode call result: {0}")]
    Decode(#[from] alloy_sol_types::Error),
    #[error("Node refused to unlock account {0}")]
    UnlockRejected(Address),
    #[error("No keystore file for {address} found in {dir:?}")]
    KeystoreNotFound { address: Address, dir: PathBuf },
    #[error("Invalid signer: {0:?}")]
    InvalidSigner(#[from] LocalSignerError),
    #[error("Signing failed: {0}")]
    Signing(#[from] alloy_signer::Error),
    #[error("ABI encoding failed: {0}")]
    Abi(#[from] alloy_dyn_abi::Error),
    #[error("Invalid ABI JSON: {0}")]
    AbiJson(#[from] serde_json::Error),
    #[error("Function `{name}` taking {arity} argument(s) not found in ABI")]
    FunctionNotFound { name: String, arity: usize },
    #[error("Expected {expected} argument(s), got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("Argument `{value}` cannot be used as `{expected}`")]
    ArgumentMismatch { expected: String, value: String },
    #[error("Other error: {0}")]
    Other(String),
}

impl From<TransportError> for ContractError {
    fn from(e: TransportError) -> Self {
        let e_str = e.to_string();
        if e_str.contains("nonce too low")
            || e_str.contains("transaction already imported")
            || e_str.contains("already known")
        {
            ContractError::SignerConflict
        } else {
            ContractError::Rpc(e)
        }
    }
}

pub type ContractResult<T> = Result<T, ContractError>;

#[cfg(test)]
mod tests {
    use alloy_transport::TransportErrorKind;

    use super::*;

    #[test]
    fn reused_nonce_is_a_signer_conflict() {
        for message in ["nonce too low", "already known", "transaction already imported"] {
            let err = ContractError::from(TransportErrorKind::custom_str(message));
            assert!(matches!(err, ContractError::SignerConflict));
            assert_eq!(
                err.to_string(),
                "Transaction rejected: the sender nonce is already used"
            );
        }
    }

    #[test]
    fn other_transport_errors_are_kept() {
        let err = ContractError::from(TransportErrorKind::custom_str("connection refused"));
        assert!(matches!(err, ContractError::Rpc(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
