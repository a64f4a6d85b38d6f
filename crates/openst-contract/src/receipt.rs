use alloy_network::ReceiptResponse as _;
use alloy_primitives::{Address, Log, TxHash, U256};
use alloy_rpc_types::TransactionReceipt;
use alloy_sol_types::SolEvent;
use serde_json::Value;

use crate::{
    MultisigEvent,
    TokenHolder::{TransactionExecutionFailed, TransactionExecutionSucceeded},
};

/// The parts of a mined transaction's receipt that decide whether an operation succeeded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub status: bool,
    pub transaction_hash: TxHash,
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
    /// The receipt exactly as the node returned it, for reporting.
    pub json: Value,
}

impl From<&TransactionReceipt> for ReceiptSummary {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            status: receipt.status(),
            transaction_hash: receipt.transaction_hash,
            contract_address: receipt.contract_address,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
            json: serde_json::to_value(receipt).unwrap_or_default(),
        }
    }
}

impl ReceiptSummary {
    /// Return the first event of type `Event` emitted by the transaction.
    pub fn find_event<Event: SolEvent>(&self) -> Option<Event> {
        self.logs
            .iter()
            .find_map(|log| Event::decode_log_data(&log.data, true).ok())
    }

    pub fn has_event<Event: SolEvent>(&self) -> bool {
        self.find_event::<Event>().is_some()
    }

    /// Address of the contract created by this transaction, if it succeeded.
    pub fn deployed_address(&self) -> Option<Address> {
        match self.status {
            true => self.contract_address,
            false => None,
        }
    }

    /// Classify the outcome of a `TokenHolder` multisig transaction. `Pending` is reported for
    /// the event the particular call emits when more confirmations are needed.
    pub fn multisig_outcome<Pending: MultisigEvent>(&self) -> MultisigOutcome {
        if !self.status {
            return MultisigOutcome::Reverted;
        }
        if let Some(event) = self.find_event::<TransactionExecutionSucceeded>() {
            return MultisigOutcome::Executed(event.transaction_id());
        }
        if let Some(event) = self.find_event::<TransactionExecutionFailed>() {
            return MultisigOutcome::ExecutionFailed(event.transaction_id());
        }
        match self.find_event::<Pending>() {
            Some(event) => MultisigOutcome::Pending(event.transaction_id()),
            None => MultisigOutcome::NoEvent,
        }
    }
}

/// What happened to a multisig proposal or confirmation, judging by its receipt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MultisigOutcome {
    /// Receipt status is false.
    Reverted,
    /// Enough confirmations were collected and the transaction was executed successfully.
    Executed(U256),
    /// Enough confirmations were collected, but the execution failed.
    ExecutionFailed(U256),
    /// Recorded, waiting for more confirmations.
    Pending(U256),
    /// The transaction was mined, but emitted none of the expected events.
    NoEvent,
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Address, Log, U256};
    use alloy_sol_types::SolEvent;

    use super::*;
    use crate::{
        TokenHolder::{TransactionConfirmed, WalletAdditionSubmitted},
        TokenRules::RuleRegistered,
    };

    const TOKEN_HOLDER: Address = address!("3D7bb53A5d731B157554E32a6499162070365C06");
    const WALLET: Address = address!("e7817ce78558ca0e43f11a975acc6027eb845a5a");

    fn log_of(event: &impl SolEvent) -> Log {
        Log {
            address: TOKEN_HOLDER,
            data: event.encode_log_data(),
        }
    }

    fn receipt(status: bool, logs: Vec<Log>) -> ReceiptSummary {
        ReceiptSummary {
            status,
            logs,
            ..Default::default()
        }
    }

    #[test]
    fn reverted_transaction_ignores_events() {
        let logs = vec![log_of(&TransactionExecutionSucceeded {
            _transactionID: U256::from(1),
        })];
        assert_eq!(
            receipt(false, logs).multisig_outcome::<TransactionConfirmed>(),
            MultisigOutcome::Reverted
        );
    }

    #[test]
    fn execution_takes_precedence_over_pending_event() {
        let logs = vec![
            log_of(&TransactionConfirmed {
                _transactionID: U256::from(2),
                _wallet: WALLET,
            }),
            log_of(&TransactionExecutionSucceeded {
                _transactionID: U256::from(2),
            }),
        ];
        assert_eq!(
            receipt(true, logs).multisig_outcome::<TransactionConfirmed>(),
            MultisigOutcome::Executed(U256::from(2))
        );
    }

    #[test]
    fn failed_execution_is_reported() {
        let logs = vec![log_of(&TransactionExecutionFailed {
            _transactionID: U256::from(3),
        })];
        assert_eq!(
            receipt(true, logs).multisig_outcome::<WalletAdditionSubmitted>(),
            MultisigOutcome::ExecutionFailed(U256::from(3))
        );
    }

    #[test]
    fn submission_is_pending_with_its_transaction_id() {
        let logs = vec![log_of(&WalletAdditionSubmitted {
            _transactionID: U256::from(7),
            _wallet: WALLET,
        })];
        assert_eq!(
            receipt(true, logs).multisig_outcome::<WalletAdditionSubmitted>(),
            MultisigOutcome::Pending(U256::from(7))
        );
    }

    #[test]
    fn unrelated_events_give_no_outcome() {
        let logs = vec![log_of(&RuleRegistered {
            _sender: WALLET,
            _ruleName: "transferRule".to_string(),
            _ruleAddress: TOKEN_HOLDER,
        })];
        let summary = receipt(true, logs);
        assert_eq!(
            summary.multisig_outcome::<WalletAdditionSubmitted>(),
            MultisigOutcome::NoEvent
        );
        assert!(summary.has_event::<RuleRegistered>());
    }

    #[test]
    fn deployed_address_requires_success() {
        let mut summary = ReceiptSummary {
            status: true,
            contract_address: Some(TOKEN_HOLDER),
            ..Default::default()
        };
        assert_eq!(summary.deployed_address(), Some(TOKEN_HOLDER));

        summary.status = false;
        assert_eq!(summary.deployed_address(), None);
    }
}
