use alloy_network::{Ethereum, EthereumWallet, Network};
use alloy_provider::{
    fillers::{FillerControlFlow, TxFiller, WalletFiller},
    Provider, ProviderBuilder, SendableTx,
};
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::{Transport, TransportResult};

use crate::{ContractError, ContractResult};

/// Creates a provider for the given RPC URL. This is a simple provider, without any fillers or
/// signer configuration. It is suitable for doing read-only operations.
pub async fn create_simple_provider(rpc_url: &str) -> ContractResult<impl Provider> {
    ProviderBuilder::new()
        .on_builtin(rpc_url)
        .await
        .map_err(ContractError::ProviderError)
}

/// Creates a provider for the given RPC URL that fills nonce, gas and chain id, but leaves
/// signing to the node (`eth_sendTransaction`). The sender account must be unlocked on the node.
pub async fn create_node_signing_provider(rpc_url: &str) -> ContractResult<impl Provider> {
    ProviderBuilder::new()
        .with_recommended_fillers()
        .filler(LoggingFiller::default())
        .on_builtin(rpc_url)
        .await
        .map_err(ContractError::ProviderError)
}

/// Creates a provider for the given RPC URL, with the given signer. This provider is suitable for
/// doing write operations, as it will sign transactions locally with the given signer.
pub async fn create_provider_with_signer(
    rpc_url: &str,
    signer: PrivateKeySigner,
) -> ContractResult<impl Provider> {
    ProviderBuilder::new()
        .with_recommended_fillers()
        .filler(WalletFiller::new(EthereumWallet::from(signer)))
        .filler(LoggingFiller::default())
        .on_builtin(rpc_url)
        .await
        .map_err(ContractError::ProviderError)
}

/// A noop filler that reports transaction details once it is prepared, just before sending.
#[derive(Copy, Clone, Debug, Default)]
pub struct LoggingFiller {}

impl TxFiller for LoggingFiller {
    type Fillable = ();

    fn status(&self, _tx: &<Ethereum as Network>::TransactionRequest) -> FillerControlFlow {
        FillerControlFlow::Finished
    }

    fn fill_sync(&self, tx: &mut SendableTx<Ethereum>) {
        match tx {
            SendableTx::Builder(tx) => {
                tracing::info!(
                    sender = ?tx.from,
                    to = ?tx.to,
                    nonce = tx.nonce,
                    gas = tx.gas,
                    "Sending a transaction"
                );
            }
            SendableTx::Envelope(_) => {} // Envelopes are never built here.
        }
    }

    async fn prepare<P: Provider<T, Ethereum>, T: Transport + Clone>(
        &self,
        _provider: &P,
        _tx: &<Ethereum as Network>::TransactionRequest,
    ) -> TransportResult<Self::Fillable> {
        Ok(())
    }

    async fn fill(
        &self,
        _fillable: Self::Fillable,
        tx: SendableTx<Ethereum>,
    ) -> TransportResult<SendableTx<Ethereum>> {
        Ok(tx)
    }
}
