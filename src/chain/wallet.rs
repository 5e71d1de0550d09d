//! EIP-1193 wallet reached over HTTP JSON-RPC
//!
//! Desktop wallets such as Frame expose the same method set a browser
//! extension injects, but over a local HTTP endpoint. HTTP has no push
//! channel, so `accountsChanged` / `chainChanged` are produced by a watcher
//! task that polls `eth_accounts` and `eth_chainId` while anyone listens.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::chain::provider::{
    ChainProvider, ListenerId, ListenerRegistry, ProviderError, ProviderEvent, ProviderEventKind,
    RpcTransport, ETH_ACCOUNTS, ETH_CHAIN_ID,
};
use crate::chain::rpc::RpcClient;

/// Wallet provider backed by an HTTP JSON-RPC endpoint
pub struct HttpWalletProvider {
    inner: Arc<Inner>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    rpc: RpcClient,
    listeners: ListenerRegistry,
    poll_interval: Duration,
}

impl HttpWalletProvider {
    pub fn new(rpc: RpcClient, poll_interval: Duration) -> Self {
        HttpWalletProvider {
            inner: Arc::new(Inner {
                rpc,
                listeners: ListenerRegistry::new(),
                poll_interval,
            }),
            watcher: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        self.inner.rpc.url()
    }

    fn ensure_watcher(&self) {
        let mut watcher = self.watcher.lock().unwrap_or_else(|p| p.into_inner());
        if watcher.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        // `on` may be called outside a runtime (e.g. from a sync test); events
        // then simply never fire.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No tokio runtime, wallet events disabled");
            return;
        };
        let inner = Arc::clone(&self.inner);
        *watcher = Some(runtime.spawn(async move { inner.watch().await }));
        tracing::debug!(url = %self.url(), "Started wallet watcher");
    }

    fn stop_watcher_if_idle(&self) {
        if !self.inner.listeners.is_empty() {
            return;
        }
        let mut watcher = self.watcher.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = watcher.take() {
            handle.abort();
            tracing::debug!(url = %self.url(), "Stopped wallet watcher");
        }
    }
}

impl Drop for HttpWalletProvider {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher.get_mut().unwrap_or_else(|p| p.into_inner()).take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl RpcTransport for HttpWalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.inner.rpc.request(method, params).await
    }
}

impl ChainProvider for HttpWalletProvider {
    fn on(&self, kind: ProviderEventKind, sink: mpsc::UnboundedSender<ProviderEvent>) -> ListenerId {
        let id = self.inner.listeners.add(kind, sink);
        self.ensure_watcher();
        id
    }

    fn off(&self, id: ListenerId) {
        self.inner.listeners.remove(id);
        self.stop_watcher_if_idle();
    }
}

/// Last values seen by the watcher
#[derive(Debug, Default, PartialEq, Eq)]
struct Snapshot {
    accounts: Option<Vec<Address>>,
    chain_id: Option<String>,
}

impl Snapshot {
    /// Record a new observation and return the events it implies.
    /// The very first observation only primes the snapshot.
    fn observe(&mut self, accounts: Option<Vec<Address>>, chain_id: Option<String>) -> Vec<ProviderEvent> {
        let mut events = Vec::new();

        if let Some(accounts) = accounts {
            if self.accounts.as_ref().is_some_and(|prev| *prev != accounts) {
                events.push(ProviderEvent::AccountsChanged(accounts.clone()));
            }
            self.accounts = Some(accounts);
        }

        if let Some(chain_id) = chain_id.map(|id| id.to_ascii_lowercase()) {
            if self.chain_id.as_ref().is_some_and(|prev| *prev != chain_id) {
                events.push(ProviderEvent::ChainChanged(chain_id.clone()));
            }
            self.chain_id = Some(chain_id);
        }

        events
    }
}

impl Inner {
    async fn watch(self: Arc<Self>) {
        let mut snapshot = Snapshot::default();
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let accounts = match self.rpc.request(ETH_ACCOUNTS, json!([])).await {
                Ok(value) => parse_accounts(&value).ok(),
                Err(e) => {
                    tracing::debug!(error = %e, "Wallet poll: eth_accounts failed");
                    None
                }
            };
            let chain_id = match self.rpc.request(ETH_CHAIN_ID, json!([])).await {
                Ok(Value::String(id)) => Some(id),
                Ok(other) => {
                    tracing::debug!(?other, "Wallet poll: unexpected eth_chainId payload");
                    None
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Wallet poll: eth_chainId failed");
                    None
                }
            };

            for event in snapshot.observe(accounts, chain_id) {
                tracing::info!(?event, "Wallet event");
                self.listeners.dispatch(&event);
            }
        }
    }
}

/// Decode an `eth_accounts` / `eth_requestAccounts` result
pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, ProviderError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ProviderError::InvalidResponse(format!("accounts: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const A: Address = address!("00000000000000000000000000000000000000a1");
    const B: Address = address!("00000000000000000000000000000000000000b2");

    #[test]
    fn test_first_observation_is_silent() {
        let mut snapshot = Snapshot::default();
        assert!(snapshot.observe(Some(vec![A]), Some("0xaa36a7".into())).is_empty());
        assert!(snapshot.observe(Some(vec![A]), Some("0xaa36a7".into())).is_empty());
    }

    #[test]
    fn test_changes_emit_events() {
        let mut snapshot = Snapshot::default();
        snapshot.observe(Some(vec![A]), Some("0xaa36a7".into()));

        let events = snapshot.observe(Some(vec![B]), Some("0x1".into()));
        assert_eq!(
            events,
            vec![
                ProviderEvent::AccountsChanged(vec![B]),
                ProviderEvent::ChainChanged("0x1".into()),
            ]
        );

        let events = snapshot.observe(Some(vec![]), None);
        assert_eq!(events, vec![ProviderEvent::AccountsChanged(vec![])]);
    }

    #[test]
    fn test_failed_poll_keeps_previous_values() {
        let mut snapshot = Snapshot::default();
        snapshot.observe(Some(vec![A]), Some("0xaa36a7".into()));
        assert!(snapshot.observe(None, None).is_empty());
        assert_eq!(snapshot.accounts, Some(vec![A]));
    }

    #[test]
    fn test_parse_accounts() {
        let accounts = parse_accounts(&json!(["0x00000000000000000000000000000000000000a1"])).unwrap();
        assert_eq!(accounts, vec![A]);
        assert!(parse_accounts(&json!([])).unwrap().is_empty());
        assert!(parse_accounts(&json!("nope")).is_err());
    }

    #[tokio::test]
    async fn test_watcher_stops_with_last_listener() {
        let provider = HttpWalletProvider::new(RpcClient::new("http://127.0.0.1:9"), Duration::from_secs(60));
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = provider.on(ProviderEventKind::ChainChanged, tx);
        assert!(provider.watcher.lock().unwrap().is_some());

        provider.off(id);
        assert!(provider.watcher.lock().unwrap().is_none());
    }
}
