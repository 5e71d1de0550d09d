//! Native value transfer on Sepolia
//!
//! The wallet signs: the transaction goes out through `eth_sendTransaction`
//! and no key material ever passes through this process.

use crate::chain::provider::RpcTransport;
use crate::chain::tx::{send_and_confirm, Receipt, ReceiptPolicy, TransactionRequest, TxError};
use crate::constants::{SEPOLIA_CHAIN_ID_NUM, TRANSFER_GAS_LIMIT};
use crate::models::ValidTransfer;

/// Build the transaction object for a validated transfer
pub fn build_transfer(transfer: &ValidTransfer) -> TransactionRequest {
    TransactionRequest { chain_id: Some(SEPOLIA_CHAIN_ID_NUM), ..Default::default() }
        .from(transfer.from)
        .to(transfer.to)
        .value(transfer.value)
        .gas_limit(TRANSFER_GAS_LIMIT)
}

/// Submit a transfer and wait for its receipt
pub async fn submit_transfer<P>(provider: &P, transfer: &ValidTransfer, policy: ReceiptPolicy) -> Result<Receipt, TxError>
where
    P: RpcTransport + ?Sized,
{
    let tx = build_transfer(transfer);
    tracing::info!(from = %transfer.from, to = %transfer.to, value = %transfer.value, "Submitting transfer");
    match send_and_confirm(provider, &tx, policy).await {
        Ok(receipt) => {
            tracing::info!(hash = %receipt.transaction_hash, "Transfer confirmed");
            Ok(receipt)
        }
        Err(e) => {
            tracing::error!(error = %e, ?tx, "Transaction failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use alloy_primitives::{address, U256};
    use serde_json::json;

    use crate::chain::provider::{ProviderError, ETH_GET_TRANSACTION_RECEIPT, ETH_SEND_TRANSACTION};
    use crate::chain::testing::{receipt_json, FakeProvider, TX_HASH};

    fn transfer() -> ValidTransfer {
        ValidTransfer {
            from: address!("00000000000000000000000000000000000000a1"),
            to: address!("00000000000000000000000000000000000000b2"),
            value: U256::from(10u64).pow(U256::from(17u64)),
        }
    }

    fn policy() -> ReceiptPolicy {
        ReceiptPolicy { interval: Duration::from_millis(1), max_attempts: 2 }
    }

    #[test]
    fn test_transfer_shape() {
        let value = serde_json::to_value(build_transfer(&transfer())).unwrap();
        assert_eq!(value["from"].as_str().unwrap().to_lowercase(), "0x00000000000000000000000000000000000000a1");
        assert_eq!(value["to"].as_str().unwrap().to_lowercase(), "0x00000000000000000000000000000000000000b2");
        assert_eq!(value["value"], "0x16345785d8a0000");
        assert_eq!(value["gas"], "0x5208");
        assert_eq!(value["chainId"], "0xaa36a7");
    }

    #[tokio::test]
    async fn test_submit_delegates_signing_to_wallet() {
        let provider = FakeProvider::new()
            .with_response(ETH_SEND_TRANSACTION, Ok(json!(TX_HASH)))
            .with_response(ETH_GET_TRANSACTION_RECEIPT, Ok(receipt_json("0x1")));

        let receipt = submit_transfer(&provider, &transfer(), policy()).await.unwrap();
        assert_eq!(receipt.transaction_hash.to_string(), TX_HASH);

        let methods: Vec<String> = provider.calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(methods, vec![ETH_SEND_TRANSACTION, ETH_GET_TRANSACTION_RECEIPT]);
    }

    #[tokio::test]
    async fn test_rejected_broadcast() {
        let provider = FakeProvider::new().with_response(
            ETH_SEND_TRANSACTION,
            Err(ProviderError::Rpc { code: 4001, message: "User denied transaction signature.".into() }),
        );
        let err = submit_transfer(&provider, &transfer(), policy()).await.unwrap_err();
        assert!(matches!(err, TxError::Provider(_)));
        assert_eq!(provider.calls_to(ETH_GET_TRANSACTION_RECEIPT), 0);
    }
}
