//! Read-only balance lookup

use alloy_primitives::utils::format_ether;
use alloy_primitives::{Address, U256};
use serde_json::json;

use crate::chain::provider::{ProviderError, RpcTransport, ETH_GET_BALANCE};

/// Balance of `address` in ether, or `"0"` when the lookup fails
pub async fn fetch_balance<P>(rpc: &P, address: Address) -> String
where
    P: RpcTransport + ?Sized,
{
    match query_balance(rpc, address).await {
        Ok(wei) => format_ether(wei),
        Err(e) => {
            tracing::error!(%address, error = %e, "Error fetching balance");
            "0".to_string()
        }
    }
}

async fn query_balance<P>(rpc: &P, address: Address) -> Result<U256, ProviderError>
where
    P: RpcTransport + ?Sized,
{
    let value = rpc.request(ETH_GET_BALANCE, json!([address, "latest"])).await?;
    serde_json::from_value(value).map_err(|e| ProviderError::InvalidResponse(format!("balance: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::testing::FakeProvider;
    use alloy_primitives::address;

    const ADDR: Address = address!("00000000000000000000000000000000000000a1");

    #[tokio::test]
    async fn test_balance_in_ether() {
        // 1.5 ether
        let rpc = FakeProvider::new().with_response(ETH_GET_BALANCE, Ok(json!("0x14d1120d7b160000")));
        let balance = fetch_balance(&rpc, ADDR).await;
        assert!(balance.starts_with("1.5"), "got {balance}");

        let calls = rpc.calls();
        assert_eq!(calls[0].1[1], "latest");
    }

    #[tokio::test]
    async fn test_balance_falls_back_to_zero() {
        let rpc = FakeProvider::new()
            .with_response(ETH_GET_BALANCE, Err(ProviderError::Transport("timeout".into())))
            .with_response(ETH_GET_BALANCE, Ok(json!("not hex")));
        assert_eq!(fetch_balance(&rpc, ADDR).await, "0");
        assert_eq!(fetch_balance(&rpc, ADDR).await, "0");
    }
}
