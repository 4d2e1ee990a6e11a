//! Shared call/send plumbing for contract gateways

use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::sol_types::{SolCall, SolEvent};
use tracing::debug;
use walletd_error::ContractError;

fn invalid_url(rpc_url: &str, err: impl std::fmt::Display) -> ContractError {
    ContractError::Provider(format!("Invalid URL {rpc_url}: {err}"))
}

/// Runs a read-only call against `to` and decodes its return value.
pub(crate) async fn call_contract<C: SolCall>(
    rpc_url: &str,
    to: Address,
    call: C,
) -> Result<C::Return, ContractError> {
    let provider = ProviderBuilder::new()
        .connect_http(rpc_url.parse().map_err(|e| invalid_url(rpc_url, e))?);

    let tx = TransactionRequest::default()
        .with_to(to)
        .with_input(call.abi_encode());

    let result = provider
        .call(tx)
        .await
        .map_err(|e| ContractError::from_raw(e.to_string()))?;

    C::abi_decode_returns(&result).map_err(|e| ContractError::Abi(format!("Decode error: {e}")))
}

/// Signs and sends `call` to `to`, waits for the receipt and fails if the
/// transaction reverted.
pub(crate) async fn send_contract<C: SolCall>(
    rpc_url: &str,
    signer: &EthereumWallet,
    to: Address,
    call: C,
    value: U256,
) -> Result<TransactionReceipt, ContractError> {
    let provider = ProviderBuilder::new()
        .wallet(signer.clone())
        .connect_http(rpc_url.parse().map_err(|e| invalid_url(rpc_url, e))?);

    let tx = TransactionRequest::default()
        .with_to(to)
        .with_input(call.abi_encode())
        .with_value(value);

    let pending = provider
        .send_transaction(tx)
        .await
        .map_err(|e| ContractError::from_raw(e.to_string()))?;
    debug!(tx_hash = ?pending.tx_hash(), function = C::SIGNATURE, "Transaction sent");

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| ContractError::Provider(format!("Failed to get receipt: {e}")))?;

    if !receipt.status() {
        return Err(ContractError::Reverted(format!(
            "transaction {} failed",
            tx_hash(&receipt)
        )));
    }
    Ok(receipt)
}

/// First `E` event emitted by `emitter` in the receipt.
pub(crate) fn find_event<E: SolEvent>(receipt: &TransactionReceipt, emitter: Address) -> Option<E> {
    receipt
        .inner
        .logs()
        .iter()
        .filter(|log| log.address() == emitter)
        .find_map(|log| E::decode_log(&log.inner).ok())
        .map(|decoded| decoded.data)
}

/// Transaction hash as `0x`-prefixed lowercase hex
pub(crate) fn tx_hash(receipt: &TransactionReceipt) -> String {
    format!("{:?}", receipt.transaction_hash)
}
