use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use crate::{
    providers::{create_node_signing_provider, create_provider_with_signer, create_simple_provider},
    receipt::ReceiptSummary,
    signing::{load_keystore_signer, unlock_account, SigningPolicy},
    ContractResult,
};

/// A connection to the node. Every operation opens its own provider, so a `Connection` is cheap
/// to keep around and to clone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    rpc_url: String,
    policy: SigningPolicy,
    gas_limit: Option<u64>,
    gas_price: Option<u128>,
}

impl Connection {
    pub fn new(rpc_url: impl Into<String>, policy: SigningPolicy) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            policy,
            gas_limit: None,
            gas_price: None,
        }
    }

    /// Use fixed gas settings for sent transactions. `None` leaves the value to estimation.
    pub fn with_gas(mut self, gas_limit: Option<u64>, gas_price: Option<u128>) -> Self {
        self.gas_limit = gas_limit;
        self.gas_price = gas_price;
        self
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Dry-run `call` against the contract at `to` and decode its return values.
    pub async fn read<C: SolCall>(&self, to: Address, call: C) -> ContractResult<C::Return> {
        debug!(%to, function = C::SIGNATURE, "Reading from contract");
        let provider = create_simple_provider(&self.rpc_url).await?;
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(call.abi_encode());
        let output = provider.call(&tx).await?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    /// Send `call` to the contract at `to` from `from` and wait for the receipt.
    pub async fn send<C: SolCall>(
        &self,
        from: Address,
        to: Address,
        call: C,
    ) -> ContractResult<ReceiptSummary> {
        debug!(%from, %to, function = C::SIGNATURE, "Calling contract");
        let tx = self
            .request(from)
            .with_to(to)
            .with_input(call.abi_encode());
        self.submit(from, tx).await
    }

    /// Send a contract creation transaction with `code` (creation bytecode followed by the
    /// encoded constructor arguments).
    pub async fn deploy(&self, from: Address, code: Bytes) -> ContractResult<ReceiptSummary> {
        debug!(%from, code_len = code.len(), "Deploying contract");
        let tx = self.request(from).with_deploy_code(code);
        self.submit(from, tx).await
    }

    /// Send `value` wei from `from` to `to`.
    pub async fn transfer_value(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> ContractResult<ReceiptSummary> {
        debug!(%from, %to, %value, "Transferring native currency");
        let tx = self.request(from).with_to(to).with_value(value);
        self.submit(from, tx).await
    }

    fn request(&self, from: Address) -> TransactionRequest {
        let mut tx = TransactionRequest::default().with_from(from);
        if let Some(gas_limit) = self.gas_limit {
            tx.set_gas_limit(gas_limit);
        }
        if let Some(gas_price) = self.gas_price {
            tx.set_gas_price(gas_price);
        }
        tx
    }

    async fn submit(&self, from: Address, tx: TransactionRequest) -> ContractResult<ReceiptSummary> {
        match &self.policy {
            SigningPolicy::NodeUnlock { passphrase } => {
                let provider = create_node_signing_provider(&self.rpc_url).await?;
                unlock_account(&provider, from, passphrase).await?;
                send_and_wait(&provider, tx).await
            }
            SigningPolicy::Keystore { dir, passphrase } => {
                let signer = load_keystore_signer(dir, from, passphrase)?;
                let provider = create_provider_with_signer(&self.rpc_url, signer).await?;
                send_and_wait(&provider, tx).await
            }
        }
    }
}

async fn send_and_wait(
    provider: &impl Provider,
    tx: TransactionRequest,
) -> ContractResult<ReceiptSummary> {
    let pending = provider.send_transaction(tx).await?;
    info!(tx_hash = %pending.tx_hash(), "Transaction submitted, waiting for the receipt");
    let receipt = pending.get_receipt().await?;
    debug!(?receipt, "Transaction mined");
    Ok(ReceiptSummary::from(&receipt))
}
