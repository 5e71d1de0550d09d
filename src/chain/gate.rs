//! Wallet connection gate: silent probe, explicit connect, network switch

use serde_json::{json, Value};

use crate::chain::provider::{
    ChainProvider, ProviderError, CODE_UNRECOGNIZED_CHAIN, ETH_ACCOUNTS, ETH_CHAIN_ID,
    ETH_REQUEST_ACCOUNTS, WALLET_ADD_CHAIN, WALLET_SWITCH_CHAIN,
};
use crate::chain::wallet::parse_accounts;
use crate::constants::{
    SEPOLIA_CHAIN_ID, SEPOLIA_CHAIN_NAME, SEPOLIA_CURRENCY_NAME, SEPOLIA_CURRENCY_SYMBOL,
    SEPOLIA_EXPLORER_URL,
};
use crate::models::{Network, Session};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("No wallet detected. Please install a wallet and set WALLET_PROVIDER_URL.")]
    NoProvider,
    #[error("Wallet access was denied")]
    Denied,
    #[error("The wallet did not share any account")]
    NoAccounts,
    #[error("Failed to connect wallet: {0}")]
    Provider(ProviderError),
}

impl From<ProviderError> for GateError {
    fn from(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            GateError::Denied
        } else {
            GateError::Provider(err)
        }
    }
}

/// Non-intrusive look at an already authorized wallet.
///
/// Never prompts and never fails: a missing provider, an empty account list
/// or a broken endpoint all yield a disconnected session.
pub async fn probe_session(provider: Option<&dyn ChainProvider>) -> Session {
    let Some(provider) = provider else {
        tracing::info!("No wallet provider configured");
        return Session::disconnected();
    };

    let accounts = match provider.request(ETH_ACCOUNTS, json!([])).await.and_then(|v| parse_accounts(&v)) {
        Ok(accounts) => accounts,
        Err(e) => {
            tracing::warn!(error = %e, "Error checking wallet connection");
            return Session::disconnected();
        }
    };

    let network = read_network(provider).await;
    let mut session = Session::new(None, network);
    session.apply_accounts(&accounts);
    tracing::info!(account = ?session.account, network = %session.network, "Wallet probed");
    session
}

/// Prompt the wallet for account access
pub async fn connect(provider: Option<&dyn ChainProvider>) -> Result<Session, GateError> {
    let provider = provider.ok_or(GateError::NoProvider)?;

    let value = provider.request(ETH_REQUEST_ACCOUNTS, json!([])).await?;
    let accounts = parse_accounts(&value)?;
    if accounts.is_empty() {
        return Err(GateError::NoAccounts);
    }

    let network = read_network(provider).await;
    let session = Session::new(accounts.first().copied(), network);
    tracing::info!(account = ?session.account, network = %session.network, "Wallet connected");
    Ok(session)
}

/// Ask the wallet to move to Sepolia, registering the chain first if the
/// wallet reports it as unknown.
pub async fn ensure_expected_chain(provider: Option<&dyn ChainProvider>, rpc_url: &str) -> Result<(), GateError> {
    let provider = provider.ok_or(GateError::NoProvider)?;

    match provider
        .request(WALLET_SWITCH_CHAIN, json!([{ "chainId": SEPOLIA_CHAIN_ID }]))
        .await
    {
        Ok(_) => Ok(()),
        Err(err) if err.code() == Some(CODE_UNRECOGNIZED_CHAIN) => {
            tracing::info!("Sepolia unknown to wallet, requesting it be added");
            provider
                .request(WALLET_ADD_CHAIN, add_chain_params(rpc_url))
                .await
                .map(|_| ())
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to add Sepolia network");
                    GateError::from(e)
                })
        }
        Err(err) => {
            tracing::error!(error = %err, "User denied network switch");
            Err(err.into())
        }
    }
}

async fn read_network(provider: &dyn ChainProvider) -> Network {
    match provider.request(ETH_CHAIN_ID, json!([])).await {
        Ok(Value::String(id)) => Network::from_chain_id(&id),
        Ok(other) => {
            tracing::warn!(?other, "Unexpected eth_chainId payload");
            Network::Unknown
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not read chain id");
            Network::Unknown
        }
    }
}

/// `wallet_addEthereumChain` parameters for Sepolia
pub fn add_chain_params(rpc_url: &str) -> Value {
    json!([{
        "chainId": SEPOLIA_CHAIN_ID,
        "chainName": SEPOLIA_CHAIN_NAME,
        "nativeCurrency": {
            "name": SEPOLIA_CURRENCY_NAME,
            "symbol": SEPOLIA_CURRENCY_SYMBOL,
            "decimals": 18
        },
        "rpcUrls": [rpc_url],
        "blockExplorerUrls": [SEPOLIA_EXPLORER_URL]
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::testing::FakeProvider;
    use alloy_primitives::address;

    const ACCOUNT: &str = "0x00000000000000000000000000000000000000a1";
    const RPC_URL: &str = "https://rpc.example";

    #[tokio::test]
    async fn test_probe_without_provider() {
        assert_eq!(probe_session(None).await, Session::disconnected());
    }

    #[tokio::test]
    async fn test_probe_with_zero_accounts_stays_disconnected() {
        let provider = FakeProvider::new()
            .with_response(ETH_ACCOUNTS, Ok(json!([])))
            .with_response(ETH_CHAIN_ID, Ok(json!("0xaa36a7")));

        let session = probe_session(provider.as_dyn()).await;
        assert!(!session.is_connected());
        assert_eq!(provider.calls_to(ETH_REQUEST_ACCOUNTS), 0);
    }

    #[tokio::test]
    async fn test_probe_reads_account_and_network() {
        let provider = FakeProvider::new()
            .with_response(ETH_ACCOUNTS, Ok(json!([ACCOUNT])))
            .with_response(ETH_CHAIN_ID, Ok(json!("0x1")));

        let session = probe_session(provider.as_dyn()).await;
        assert_eq!(session.account, Some(address!("00000000000000000000000000000000000000a1")));
        assert_eq!(session.network, Network::Wrong("0x1".into()));
    }

    #[tokio::test]
    async fn test_probe_swallows_errors() {
        let provider = FakeProvider::new()
            .with_response(ETH_ACCOUNTS, Err(ProviderError::Transport("down".into())));
        assert_eq!(probe_session(provider.as_dyn()).await, Session::disconnected());
    }

    #[tokio::test]
    async fn test_connect_without_provider() {
        assert_eq!(connect(None).await, Err(GateError::NoProvider));
    }

    #[tokio::test]
    async fn test_connect_denied() {
        let provider = FakeProvider::new().with_response(
            ETH_REQUEST_ACCOUNTS,
            Err(ProviderError::Rpc { code: 4001, message: "User rejected the request.".into() }),
        );
        assert_eq!(connect(provider.as_dyn()).await, Err(GateError::Denied));
        assert_eq!(provider.calls_to(ETH_CHAIN_ID), 0);
    }

    #[tokio::test]
    async fn test_connect_grants_session() {
        let provider = FakeProvider::new()
            .with_response(ETH_REQUEST_ACCOUNTS, Ok(json!([ACCOUNT])))
            .with_response(ETH_CHAIN_ID, Ok(json!("0xaa36a7")));

        let session = connect(provider.as_dyn()).await.unwrap();
        assert!(session.is_connected());
        assert!(session.network.is_expected());
    }

    #[tokio::test]
    async fn test_switch_adds_unknown_chain() {
        let provider = FakeProvider::new()
            .with_response(
                WALLET_SWITCH_CHAIN,
                Err(ProviderError::Rpc { code: 4902, message: "Unrecognized chain ID".into() }),
            )
            .with_response(WALLET_ADD_CHAIN, Ok(Value::Null));

        ensure_expected_chain(provider.as_dyn(), RPC_URL).await.unwrap();

        let calls = provider.calls();
        assert_eq!(calls[1].0, WALLET_ADD_CHAIN);
        assert_eq!(calls[1].1[0]["chainId"], SEPOLIA_CHAIN_ID);
        assert_eq!(calls[1].1[0]["nativeCurrency"]["decimals"], 18);
        assert_eq!(calls[1].1[0]["rpcUrls"][0], RPC_URL);
    }

    #[tokio::test]
    async fn test_switch_denied() {
        let provider = FakeProvider::new().with_response(
            WALLET_SWITCH_CHAIN,
            Err(ProviderError::Rpc { code: 4001, message: "User rejected the request.".into() }),
        );
        assert_eq!(ensure_expected_chain(provider.as_dyn(), RPC_URL).await, Err(GateError::Denied));
        assert_eq!(provider.calls_to(WALLET_ADD_CHAIN), 0);
    }
}
