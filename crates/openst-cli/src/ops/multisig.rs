//! Proposals and confirmations on the `TokenHolder` multisig.
//!
//! Every submission is also a first confirmation, so with a requirement of 1 any of these calls
//! may end with the proposal already executed.

use std::fmt::Debug;

use alloy_sol_types::SolCall;
use anyhow::{bail, Context, Result};
use openst_contract::{
    alloy_primitives::Address,
    MultisigEvent, MultisigOutcome, ReceiptSummary,
    TokenHolder::{
        self, SessionAuthorizationSubmitted, TransactionConfirmed, TransactionExecutionFailed,
        TransactionExecutionSucceeded, WalletAdditionSubmitted, WalletRemovalSubmitted,
    },
};

use crate::{
    config::{
        ConfirmTransactionCmd, ProposeEphemeralKeyCmd, ProposeRevokeWalletCmd, ProposeWalletCmd,
        RevokeEphemeralKeyCmd,
    },
    performer::{Performer, Success},
};

pub async fn propose_wallet(performer: &mut Performer, cmd: ProposeWalletCmd) -> Result<Success> {
    performer.log(format!(
        "Proposing wallet {} for TokenHolder {} from {}",
        cmd.wallet_to_propose, cmd.token_holder, cmd.wallet
    ));
    let receipt = send(
        performer,
        cmd.wallet,
        cmd.token_holder,
        TokenHolder::submitAddWalletCall {
            _wallet: cmd.wallet_to_propose,
        },
    )
    .await?;
    report::<WalletAdditionSubmitted>(
        performer,
        &receipt,
        "WalletAdditionSubmitted",
        "Wallet addition submitted. More Confirmations Needed.",
    )
}

pub async fn propose_revoke_wallet(
    performer: &mut Performer,
    cmd: ProposeRevokeWalletCmd,
) -> Result<Success> {
    performer.log(format!(
        "Proposing removal of wallet {} from TokenHolder {} by {}",
        cmd.wallet_to_revoke, cmd.token_holder, cmd.wallet
    ));
    let receipt = send(
        performer,
        cmd.wallet,
        cmd.token_holder,
        TokenHolder::submitRemoveWalletCall {
            _wallet: cmd.wallet_to_revoke,
        },
    )
    .await?;
    report::<WalletRemovalSubmitted>(
        performer,
        &receipt,
        "WalletRemovalSubmitted",
        "Wallet removal submitted. More Confirmations Needed.",
    )
}

pub async fn confirm_transaction(
    performer: &mut Performer,
    cmd: ConfirmTransactionCmd,
) -> Result<Success> {
    performer.log(format!(
        "Confirming transaction {} of TokenHolder {} by {}",
        cmd.transaction_id, cmd.token_holder, cmd.wallet
    ));
    let receipt = send(
        performer,
        cmd.wallet,
        cmd.token_holder,
        TokenHolder::confirmTransactionCall {
            _transactionID: cmd.transaction_id,
        },
    )
    .await?;
    report::<TransactionConfirmed>(
        performer,
        &receipt,
        "TransactionConfirmed",
        "Transaction Confirmed. More Confirmations Needed.",
    )
}

pub async fn propose_ephemeral_key(
    performer: &mut Performer,
    cmd: ProposeEphemeralKeyCmd,
) -> Result<Success> {
    performer.log(format!(
        "Proposing ephemeral key {} for TokenHolder {} (spending limit {}, expiration height {})",
        cmd.ephemeral_key, cmd.token_holder, cmd.spending_limit, cmd.expiration_height
    ));
    let receipt = send(
        performer,
        cmd.wallet,
        cmd.token_holder,
        TokenHolder::submitAuthorizeSessionCall {
            _sessionKey: cmd.ephemeral_key,
            _spendingLimit: cmd.spending_limit,
            _expirationHeight: cmd.expiration_height,
        },
    )
    .await?;
    report::<SessionAuthorizationSubmitted>(
        performer,
        &receipt,
        "SessionAuthorizationSubmitted",
        "Session authorization submitted. More Confirmations Needed.",
    )
}

pub async fn revoke_ephemeral_key(
    performer: &mut Performer,
    cmd: RevokeEphemeralKeyCmd,
) -> Result<Success> {
    performer.log(format!(
        "Revoking ephemeral key {} of TokenHolder {}",
        cmd.ephemeral_key, cmd.token_holder
    ));
    let receipt = send(
        performer,
        cmd.wallet,
        cmd.token_holder,
        TokenHolder::revokeSessionCall {
            _sessionKey: cmd.ephemeral_key,
        },
    )
    .await?;

    match receipt.status {
        true => Ok(Success::subject("Transaction Succeeded")),
        false => bail!("Failed to revoke ephemeral key. See receipt for details."),
    }
}

async fn send<C: SolCall>(
    performer: &mut Performer,
    wallet: Address,
    token_holder: Address,
    call: C,
) -> Result<ReceiptSummary> {
    let receipt = performer
        .connection()?
        .send(wallet, token_holder, call)
        .await
        .context("Failed to send transaction. See error for details.")?;
    performer.log_receipt(&receipt);
    Ok(receipt)
}

/// Turn the receipt of a submission or confirmation into the operation's result. `Pending` is
/// the event emitted when more confirmations are needed.
fn report<Pending: MultisigEvent + Debug>(
    performer: &mut Performer,
    receipt: &ReceiptSummary,
    pending_name: &str,
    pending_subject: &str,
) -> Result<Success> {
    match receipt.multisig_outcome::<Pending>() {
        MultisigOutcome::Reverted => {
            bail!("Failed to Confirm Transaction. See receipt for details.")
        }
        MultisigOutcome::Executed(_) => {
            log_event::<TransactionExecutionSucceeded>(
                performer,
                receipt,
                "TransactionExecutionSucceeded",
            );
            Ok(Success::subject("Transaction Executed and Succeeded"))
        }
        MultisigOutcome::ExecutionFailed(_) => {
            log_event::<TransactionExecutionFailed>(
                performer,
                receipt,
                "TransactionExecutionFailed",
            );
            bail!(
                "Failed to Execute Transaction. See TransactionExecutionFailed event for details."
            )
        }
        MultisigOutcome::Pending(transaction_id) => {
            log_event::<Pending>(performer, receipt, pending_name);
            Ok(Success::new(
                pending_subject,
                format!("transaction id: {transaction_id}"),
            ))
        }
        MultisigOutcome::NoEvent => {
            bail!(
                "Transaction mined, but {pending_name} event was not found. \
                 See receipt for details."
            )
        }
    }
}

fn log_event<Event: MultisigEvent + Debug>(
    performer: &mut Performer,
    receipt: &ReceiptSummary,
    name: &str,
) {
    if let Some(event) = receipt.find_event::<Event>() {
        performer.log_event(name, &event);
    }
}
