#![allow(clippy::too_many_arguments)]

use alloy_primitives::U256;
use alloy_sol_types::sol;
use TokenHolder::*;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    contract TokenHolder {
        constructor(
            address _token,
            address _tokenRules,
            address[] memory _wallets,
            uint256 _required
        );

        event WalletAdditionSubmitted(uint256 indexed _transactionID, address _wallet);
        event WalletRemovalSubmitted(uint256 indexed _transactionID, address _wallet);
        event SessionAuthorizationSubmitted(
            uint256 indexed _transactionID,
            address _sessionKey,
            uint256 _spendingLimit,
            uint256 _expirationHeight
        );
        event TransactionConfirmed(uint256 indexed _transactionID, address _wallet);
        event TransactionExecutionSucceeded(uint256 indexed _transactionID);
        event TransactionExecutionFailed(uint256 indexed _transactionID);
        event RuleExecuted(
            address indexed _to,
            bytes4 _functionSelector,
            address _ephemeralKey,
            uint256 _nonce,
            bytes32 _messageHash,
            bool _status
        );

        function tokenRules() external view returns (address);

        function ephemeralKeys(address) external view returns (
            uint256 spendingLimit,
            uint256 nonce,
            uint256 expirationHeight,
            uint8 status
        );

        function EXECUTE_RULE_CALLPREFIX() external view returns (bytes4);

        function submitAddWallet(address _wallet) external returns (uint256 transactionID_);
        function submitRemoveWallet(address _wallet) external returns (uint256 transactionID_);
        function confirmTransaction(uint256 _transactionID) external;

        function submitAuthorizeSession(
            address _sessionKey,
            uint256 _spendingLimit,
            uint256 _expirationHeight
        ) external returns (uint256 transactionID_);
        function revokeSession(address _sessionKey) external;

        function executeRule(
            address _to,
            bytes calldata _data,
            uint256 _nonce,
            uint8 _v,
            bytes32 _r,
            bytes32 _s
        ) external payable returns (bool executionStatus_);
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    contract TokenRules {
        constructor(address _organization, address _token);

        event RuleRegistered(address indexed _sender, string _ruleName, address _ruleAddress);

        function registerRule(
            string calldata _ruleName,
            address _ruleAddress,
            string calldata _ruleAbi
        ) external;

        function rulesByNameHash(bytes32) external view returns (uint256 index, bool exists);

        function rules(uint256) external view returns (
            string ruleName,
            address ruleAddress,
            string ruleAbi
        );
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    contract MockToken {
        event Transfer(address indexed _from, address indexed _to, uint256 _value);

        function totalSupply() external view returns (uint256);

        function balanceOf(address _owner) external view returns (uint256 balance);

        function transfer(address _to, uint256 _value) external returns (bool success);
    }
}

/// Events emitted by `TokenHolder` once a multisig proposal is submitted, confirmed or executed.
///
/// All of them carry the id of the multisig transaction they refer to.
pub trait MultisigEvent: alloy_sol_types::SolEvent {
    fn transaction_id(&self) -> U256;
}

macro_rules! impl_multisig_event {
    ($event:ident) => {
        impl MultisigEvent for $event {
            fn transaction_id(&self) -> U256 {
                self._transactionID
            }
        }
    };
}

impl_multisig_event!(WalletAdditionSubmitted);
impl_multisig_event!(WalletRemovalSubmitted);
impl_multisig_event!(SessionAuthorizationSubmitted);
impl_multisig_event!(TransactionConfirmed);
impl_multisig_event!(TransactionExecutionSucceeded);
impl_multisig_event!(TransactionExecutionFailed);
