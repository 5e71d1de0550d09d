//! Scripted provider for tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::chain::provider::{
    ChainProvider, ListenerId, ListenerRegistry, ProviderError, ProviderEvent, ProviderEventKind,
    RpcTransport,
};

pub const TX_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

/// A complete EIP-1559 receipt in the node's wire format
pub fn receipt_json(status: &str) -> Value {
    json!({
        "type": "0x2",
        "status": status,
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": TX_HASH,
        "transactionIndex": "0x0",
        "blockHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
        "blockNumber": "0x10",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": "0x00000000000000000000000000000000000000a1",
        "to": "0x00000000000000000000000000000000000000b0",
        "contractAddress": null,
    })
}

/// Answers requests from per-method queues and records every call
#[derive(Default)]
pub struct FakeProvider {
    scripted: Mutex<HashMap<String, VecDeque<Result<Value, ProviderError>>>>,
    fallback: Mutex<HashMap<String, Result<Value, ProviderError>>>,
    calls: Mutex<Vec<(String, Value)>>,
    listeners: ListenerRegistry,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot answer for `method`
    pub fn with_response(self, method: &str, result: Result<Value, ProviderError>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Answer used once the queue for `method` is empty
    pub fn with_fallback(self, method: &str, result: Result<Value, ProviderError>) -> Self {
        self.fallback.lock().unwrap().insert(method.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(m, _)| m == method).count()
    }

    pub fn emit(&self, event: ProviderEvent) {
        self.listeners.dispatch(&event);
    }

    pub fn as_dyn(&self) -> Option<&dyn ChainProvider> {
        Some(self as &dyn ChainProvider)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl RpcTransport for FakeProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push((method.to_string(), params));

        if let Some(result) = self.scripted.lock().unwrap().get_mut(method).and_then(VecDeque::pop_front) {
            return result;
        }
        if let Some(result) = self.fallback.lock().unwrap().get(method) {
            return result.clone();
        }
        Err(ProviderError::Rpc {
            code: -32601,
            message: format!("method {} not scripted", method),
        })
    }
}

impl ChainProvider for FakeProvider {
    fn on(&self, kind: ProviderEventKind, sink: mpsc::UnboundedSender<ProviderEvent>) -> ListenerId {
        self.listeners.add(kind, sink)
    }

    fn off(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}
