//! Wallet provider capability
//!
//! Mirrors the EIP-1193 surface (`request`, `on`, `off`) so the rest of the
//! crate talks to a trait object handed in at construction time instead of
//! a concrete wallet.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

pub const ETH_ACCOUNTS: &str = "eth_accounts";
pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const ETH_CHAIN_ID: &str = "eth_chainId";
pub const ETH_GET_BALANCE: &str = "eth_getBalance";
pub const ETH_CALL: &str = "eth_call";
pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";
pub const ETH_GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
pub const WALLET_SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
pub const WALLET_ADD_CHAIN: &str = "wallet_addEthereumChain";

/// EIP-1193 "user rejected the request"
pub const CODE_USER_REJECTED: i64 = 4001;
/// EIP-1193 "unauthorized"
pub const CODE_UNAUTHORIZED: i64 = 4100;
/// EIP-3326 "unrecognized chain id", the wallet does not know the chain yet
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

/// Errors surfaced by a provider request
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn code(&self) -> Option<i64> {
        match self {
            ProviderError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self.code(), Some(CODE_USER_REJECTED | CODE_UNAUTHORIZED))
    }
}

/// Anything that can answer JSON-RPC requests
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

/// Kinds of events a provider pushes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

/// Event pushed by a provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(String),
}

impl ProviderEvent {
    pub fn kind(&self) -> ProviderEventKind {
        match self {
            ProviderEvent::AccountsChanged(_) => ProviderEventKind::AccountsChanged,
            ProviderEvent::ChainChanged(_) => ProviderEventKind::ChainChanged,
        }
    }
}

/// Handle returned by [`ChainProvider::on`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Injected wallet provider: request routing plus pushed events
pub trait ChainProvider: RpcTransport {
    /// Register `sink` for events of `kind`
    fn on(&self, kind: ProviderEventKind, sink: mpsc::UnboundedSender<ProviderEvent>) -> ListenerId;

    /// Remove a listener. Unknown ids are ignored.
    fn off(&self, id: ListenerId);
}

/// Keeps a listener registered until dropped
pub struct Subscription {
    provider: Arc<dyn ChainProvider>,
    id: ListenerId,
}

impl Subscription {
    pub fn new(
        provider: Arc<dyn ChainProvider>,
        kind: ProviderEventKind,
        sink: mpsc::UnboundedSender<ProviderEvent>,
    ) -> Self {
        let id = provider.on(kind, sink);
        Subscription { provider, id }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.provider.off(self.id);
    }
}

struct Listener {
    kind: ProviderEventKind,
    sink: mpsc::UnboundedSender<ProviderEvent>,
}

/// Listener bookkeeping shared by provider implementations
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<ListenerId, Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: ProviderEventKind, sink: mpsc::UnboundedSender<ProviderEvent>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, Listener { kind, sink });
        id
    }

    /// Returns true when the listener existed
    pub fn remove(&self, id: ListenerId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every listener of its kind, dropping closed sinks
    pub fn dispatch(&self, event: &ProviderEvent) {
        let kind = event.kind();
        self.lock().retain(|id, listener| {
            if listener.kind != kind {
                return true;
            }
            let delivered = listener.sink.send(event.clone()).is_ok();
            if !delivered {
                tracing::debug!(?id, ?kind, "Dropping closed provider listener");
            }
            delivered
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ListenerId, Listener>> {
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
