//! Chain layer - wallet provider access, transactions and contract calls
//!
//! The Chain actor receives wallet commands, runs them against the
//! injected provider and sends back responses and wallet events.

pub mod provider;
pub mod rpc;
pub mod wallet;
pub mod gate;
pub mod tx;
pub mod transfer;
pub mod balance;
pub mod notes;
pub mod actor;

#[cfg(test)]
pub mod testing;

pub use actor::ChainActor;
pub use provider::{ChainProvider, ProviderError, ProviderEvent, RpcTransport};
pub use rpc::RpcClient;
pub use wallet::HttpWalletProvider;
