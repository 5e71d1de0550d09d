//! Chain messages - communication between App and Chain layers
//!
//! Every message is stamped with the epoch of the tab that issued it. A tab
//! bumps its epoch when it reloads, which turns late answers to requests
//! issued before the reload into no-ops.

use alloy_primitives::{Address, B256};

use crate::chain::gate::GateError;
use crate::chain::provider::ProviderEvent;
use crate::messages::ui_events::AppTab;
use crate::models::{Note, Session, ValidTransfer};

/// Commands sent from App layer to Chain layer
#[derive(Debug, Clone)]
pub enum ChainCommand {
    /// Subscribe the tab to account and chain events
    Watch { tab: AppTab, epoch: u64 },
    /// Drop the tab's event subscriptions
    Unwatch { tab: AppTab },
    /// Silent `eth_accounts` + `eth_chainId` lookup
    Probe { tab: AppTab, epoch: u64 },
    /// Prompt the wallet for account access
    Connect { tab: AppTab, epoch: u64 },
    /// Ask the wallet to switch to (or add) Sepolia
    SwitchNetwork { epoch: u64 },
    FetchBalance { epoch: u64, address: Address },
    SendTransfer { epoch: u64, transfer: ValidTransfer },
    FetchNotes { epoch: u64 },
    AddNote { epoch: u64, from: Address, text: String },
    /// Shutdown the chain actor
    Shutdown,
}

/// Responses sent from Chain layer to App layer
#[derive(Debug, Clone)]
pub enum ChainResponse {
    Probed {
        tab: AppTab,
        epoch: u64,
        session: Session,
    },
    Connected {
        tab: AppTab,
        epoch: u64,
        result: Result<Session, GateError>,
    },
    NetworkSwitched {
        epoch: u64,
        result: Result<(), GateError>,
    },
    Balance {
        epoch: u64,
        address: Address,
        balance: String,
    },
    TransferFinished {
        epoch: u64,
        result: Result<B256, String>,
    },
    NotesFetched {
        epoch: u64,
        result: Result<Vec<Note>, String>,
    },
    NoteAdded {
        epoch: u64,
        result: Result<B256, String>,
    },
    /// Account or chain event pushed by the wallet
    Event {
        tab: AppTab,
        epoch: u64,
        event: ProviderEvent,
    },
}

impl ChainResponse {
    /// Tab this response belongs to
    pub fn tab(&self) -> AppTab {
        match self {
            ChainResponse::Probed { tab, .. }
            | ChainResponse::Connected { tab, .. }
            | ChainResponse::Event { tab, .. } => *tab,
            ChainResponse::NetworkSwitched { .. }
            | ChainResponse::Balance { .. }
            | ChainResponse::TransferFinished { .. } => AppTab::Send,
            ChainResponse::NotesFetched { .. } | ChainResponse::NoteAdded { .. } => AppTab::Notes,
        }
    }

    /// Epoch of the command this response answers
    pub fn epoch(&self) -> u64 {
        match self {
            ChainResponse::Probed { epoch, .. }
            | ChainResponse::Connected { epoch, .. }
            | ChainResponse::NetworkSwitched { epoch, .. }
            | ChainResponse::Balance { epoch, .. }
            | ChainResponse::TransferFinished { epoch, .. }
            | ChainResponse::NotesFetched { epoch, .. }
            | ChainResponse::NoteAdded { epoch, .. }
            | ChainResponse::Event { epoch, .. } => *epoch,
        }
    }
}
