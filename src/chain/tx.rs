//! Provider-signed transactions and receipt polling

use std::time::Duration;

use alloy_primitives::B256;
use serde_json::{json, Value};

use crate::chain::provider::{ProviderError, RpcTransport, ETH_GET_TRANSACTION_RECEIPT, ETH_SEND_TRANSACTION};
use crate::constants::{RECEIPT_POLL_ATTEMPTS, RECEIPT_POLL_INTERVAL};

pub use alloy_rpc_types_eth::{TransactionInput, TransactionRequest};

/// Receipt as returned by `eth_getTransactionReceipt`
pub type Receipt = alloy_rpc_types_eth::TransactionReceipt;

/// How long to wait for inclusion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        ReceiptPolicy {
            interval: RECEIPT_POLL_INTERVAL,
            max_attempts: RECEIPT_POLL_ATTEMPTS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("transaction {0} not confirmed after {1} polls")]
    Unconfirmed(B256, u32),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Ask the provider to sign and broadcast `tx`, returning its hash
pub async fn send_transaction<P>(provider: &P, tx: &TransactionRequest) -> Result<B256, TxError>
where
    P: RpcTransport + ?Sized,
{
    let params = json!([tx]);
    let value = provider.request(ETH_SEND_TRANSACTION, params).await?;
    serde_json::from_value(value).map_err(|e| TxError::InvalidResponse(format!("transaction hash: {}", e)))
}

/// Poll until the transaction is included, then check its status
pub async fn wait_for_receipt<P>(provider: &P, hash: B256, policy: ReceiptPolicy) -> Result<Receipt, TxError>
where
    P: RpcTransport + ?Sized,
{
    for attempt in 1..=policy.max_attempts {
        let value = provider.request(ETH_GET_TRANSACTION_RECEIPT, json!([hash])).await?;
        if value != Value::Null {
            let receipt: Receipt = serde_json::from_value(value)
                .map_err(|e| TxError::InvalidResponse(format!("receipt: {}", e)))?;
            tracing::info!(%hash, attempt, block = ?receipt.block_number, status = receipt.status(), "Receipt received");
            if !receipt.status() {
                return Err(TxError::Reverted(hash));
            }
            return Ok(receipt);
        }
        tracing::debug!(%hash, attempt, "Receipt pending");
        tokio::time::sleep(policy.interval).await;
    }
    Err(TxError::Unconfirmed(hash, policy.max_attempts))
}

/// `send_transaction` followed by `wait_for_receipt`
pub async fn send_and_confirm<P>(provider: &P, tx: &TransactionRequest, policy: ReceiptPolicy) -> Result<Receipt, TxError>
where
    P: RpcTransport + ?Sized,
{
    let hash = send_transaction(provider, tx).await?;
    tracing::info!(%hash, from = ?tx.from, to = ?tx.to, "Transaction submitted");
    wait_for_receipt(provider, hash, policy).await
}
