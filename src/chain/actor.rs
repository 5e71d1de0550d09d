//! Chain actor - runs wallet and contract calls in the Tokio async runtime

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::chain::balance::fetch_balance;
use crate::chain::gate::{self, GateError};
use crate::chain::notes::{ContractError, NotesContract};
use crate::chain::provider::{ChainProvider, ProviderEventKind, RpcTransport, Subscription};
use crate::chain::transfer::submit_transfer;
use crate::chain::tx::ReceiptPolicy;
use crate::messages::ui_events::AppTab;
use crate::messages::{ChainCommand, ChainResponse};

/// Chain actor that executes wallet commands and forwards wallet events
pub struct ChainActor {
    /// `None` when no wallet is configured
    wallet: Option<Arc<dyn ChainProvider>>,
    /// Read-only endpoint for balances
    rpc: Arc<dyn RpcTransport>,
    rpc_url: String,
    notes: Option<Arc<NotesContract>>,
    receipt_policy: ReceiptPolicy,
    response_tx: mpsc::UnboundedSender<ChainResponse>,
    active_requests: JoinSet<()>,
    watches: HashMap<AppTab, Vec<Subscription>>,
}

impl ChainActor {
    pub fn new(
        wallet: Option<Arc<dyn ChainProvider>>,
        rpc: Arc<dyn RpcTransport>,
        rpc_url: impl Into<String>,
        notes: Option<Arc<NotesContract>>,
        response_tx: mpsc::UnboundedSender<ChainResponse>,
    ) -> Self {
        ChainActor {
            wallet,
            rpc,
            rpc_url: rpc_url.into(),
            notes,
            receipt_policy: ReceiptPolicy::default(),
            response_tx,
            active_requests: JoinSet::new(),
            watches: HashMap::new(),
        }
    }

    pub fn with_receipt_policy(mut self, policy: ReceiptPolicy) -> Self {
        self.receipt_policy = policy;
        self
    }

    /// Run the chain actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<ChainCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(ChainCommand::Shutdown) | None => {
                            // Unregister every listener before the provider goes away
                            self.watches.clear();
                            self.active_requests.abort_all();
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd),
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }
    }

    fn handle_command(&mut self, cmd: ChainCommand) {
        let response_tx = self.response_tx.clone();
        let wallet = self.wallet.clone();

        match cmd {
            ChainCommand::Watch { tab, epoch } => self.watch(tab, epoch),

            ChainCommand::Unwatch { tab } => {
                if self.watches.remove(&tab).is_some() {
                    tracing::debug!(?tab, "Dropped wallet subscriptions");
                }
            }

            ChainCommand::Probe { tab, epoch } => {
                self.active_requests.spawn(async move {
                    let session = gate::probe_session(wallet.as_deref()).await;
                    let _ = response_tx.send(ChainResponse::Probed { tab, epoch, session });
                });
            }

            ChainCommand::Connect { tab, epoch } => {
                self.active_requests.spawn(async move {
                    tracing::info!(?tab, "Requesting wallet access");
                    let result = gate::connect(wallet.as_deref()).await;
                    let _ = response_tx.send(ChainResponse::Connected { tab, epoch, result });
                });
            }

            ChainCommand::SwitchNetwork { epoch } => {
                let rpc_url = self.rpc_url.clone();
                self.active_requests.spawn(async move {
                    let result = gate::ensure_expected_chain(wallet.as_deref(), &rpc_url).await;
                    let _ = response_tx.send(ChainResponse::NetworkSwitched { epoch, result });
                });
            }

            ChainCommand::FetchBalance { epoch, address } => {
                let rpc = self.rpc.clone();
                self.active_requests.spawn(async move {
                    let balance = fetch_balance(rpc.as_ref(), address).await;
                    let _ = response_tx.send(ChainResponse::Balance { epoch, address, balance });
                });
            }

            ChainCommand::SendTransfer { epoch, transfer } => {
                let policy = self.receipt_policy;
                self.active_requests.spawn(async move {
                    let result = match wallet {
                        Some(wallet) => submit_transfer(wallet.as_ref(), &transfer, policy)
                            .await
                            .map(|receipt| receipt.transaction_hash)
                            .map_err(|e| e.to_string()),
                        None => Err(GateError::NoProvider.to_string()),
                    };
                    let _ = response_tx.send(ChainResponse::TransferFinished { epoch, result });
                });
            }

            ChainCommand::FetchNotes { epoch } => {
                let notes = self.notes.clone();
                self.active_requests.spawn(async move {
                    let result = match (wallet, notes) {
                        (Some(wallet), Some(notes)) => notes.fetch_notes(wallet.as_ref()).await.map_err(|e| e.to_string()),
                        (None, _) => Err(GateError::NoProvider.to_string()),
                        (_, None) => Err(ContractError::NotConfigured.to_string()),
                    };
                    let _ = response_tx.send(ChainResponse::NotesFetched { epoch, result });
                });
            }

            ChainCommand::AddNote { epoch, from, text } => {
                let notes = self.notes.clone();
                let policy = self.receipt_policy;
                self.active_requests.spawn(async move {
                    let result = match (wallet, notes) {
                        (Some(wallet), Some(notes)) => notes
                            .add_note(wallet.as_ref(), from, &text, policy)
                            .await
                            .map(|receipt| receipt.transaction_hash)
                            .map_err(|e| e.to_string()),
                        (None, _) => Err(GateError::NoProvider.to_string()),
                        (_, None) => Err(ContractError::NotConfigured.to_string()),
                    };
                    let _ = response_tx.send(ChainResponse::NoteAdded { epoch, result });
                });
            }

            ChainCommand::Shutdown => {}
        }
    }

    /// Subscribe `tab` to wallet events, replacing any earlier subscription
    fn watch(&mut self, tab: AppTab, epoch: u64) {
        let Some(wallet) = self.wallet.clone() else {
            return;
        };
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let subscriptions = vec![
            Subscription::new(wallet.clone(), ProviderEventKind::AccountsChanged, event_tx.clone()),
            Subscription::new(wallet, ProviderEventKind::ChainChanged, event_tx),
        ];
        self.watches.insert(tab, subscriptions);

        // Ends once both subscriptions are dropped and their senders go with them
        let response_tx = self.response_tx.clone();
        self.active_requests.spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if response_tx.send(ChainResponse::Event { tab, epoch, event }).is_err() {
                    break;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::provider::{ProviderError, ProviderEvent, ETH_ACCOUNTS, ETH_CALL, ETH_CHAIN_ID};
    use crate::chain::testing::FakeProvider;
    use crate::models::Network;
    use serde_json::json;

    fn spawn_actor(
        provider: Option<Arc<FakeProvider>>,
    ) -> (mpsc::UnboundedSender<ChainCommand>, mpsc::UnboundedReceiver<ChainResponse>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();
        let wallet = provider.map(|p| p as Arc<dyn ChainProvider>);
        let rpc: Arc<dyn RpcTransport> = Arc::new(FakeProvider::new());
        let actor = ChainActor::new(wallet, rpc, "https://rpc.example", None, resp_tx);
        tokio::spawn(actor.run(cmd_rx));
        (cmd_tx, resp_rx)
    }

    #[tokio::test]
    async fn test_watch_forwards_and_unwatch_unregisters() {
        let provider = Arc::new(FakeProvider::new());
        let (cmd_tx, mut resp_rx) = spawn_actor(Some(provider.clone()));

        cmd_tx.send(ChainCommand::Watch { tab: AppTab::Notes, epoch: 3 }).unwrap();
        // Commands are handled in order, so the probe answer means Watch is done
        cmd_tx.send(ChainCommand::Probe { tab: AppTab::Notes, epoch: 3 }).unwrap();
        assert!(matches!(resp_rx.recv().await, Some(ChainResponse::Probed { .. })));
        assert_eq!(provider.listener_count(), 2);

        provider.emit(ProviderEvent::ChainChanged("0x1".into()));
        match resp_rx.recv().await {
            Some(ChainResponse::Event { tab, epoch, event }) => {
                assert_eq!(tab, AppTab::Notes);
                assert_eq!(epoch, 3);
                assert_eq!(event, ProviderEvent::ChainChanged("0x1".into()));
            }
            other => panic!("unexpected {other:?}"),
        }

        cmd_tx.send(ChainCommand::Unwatch { tab: AppTab::Notes }).unwrap();
        cmd_tx.send(ChainCommand::Probe { tab: AppTab::Notes, epoch: 3 }).unwrap();
        assert!(matches!(resp_rx.recv().await, Some(ChainResponse::Probed { .. })));
        assert_eq!(provider.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_unregisters_all_tabs() {
        let provider = Arc::new(FakeProvider::new());
        let (cmd_tx, mut resp_rx) = spawn_actor(Some(provider.clone()));

        cmd_tx.send(ChainCommand::Watch { tab: AppTab::Send, epoch: 0 }).unwrap();
        cmd_tx.send(ChainCommand::Watch { tab: AppTab::Notes, epoch: 0 }).unwrap();
        cmd_tx.send(ChainCommand::Probe { tab: AppTab::Send, epoch: 0 }).unwrap();
        resp_rx.recv().await;
        assert_eq!(provider.listener_count(), 4);

        cmd_tx.send(ChainCommand::Shutdown).unwrap();
        // The actor drops its response sender on exit
        while resp_rx.recv().await.is_some() {}
        assert_eq!(provider.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_probe_reports_session() {
        let provider = Arc::new(
            FakeProvider::new()
                .with_response(ETH_ACCOUNTS, Ok(json!(["0x00000000000000000000000000000000000000a1"])))
                .with_response(ETH_CHAIN_ID, Ok(json!("0xaa36a7"))),
        );
        let (cmd_tx, mut resp_rx) = spawn_actor(Some(provider));

        cmd_tx.send(ChainCommand::Probe { tab: AppTab::Send, epoch: 7 }).unwrap();
        match resp_rx.recv().await {
            Some(ChainResponse::Probed { epoch, session, .. }) => {
                assert_eq!(epoch, 7);
                assert!(session.is_connected());
                assert_eq!(session.network, Network::Expected);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_wallet_fails_connect() {
        let (cmd_tx, mut resp_rx) = spawn_actor(None);

        cmd_tx.send(ChainCommand::Watch { tab: AppTab::Send, epoch: 0 }).unwrap();
        cmd_tx.send(ChainCommand::Connect { tab: AppTab::Send, epoch: 0 }).unwrap();
        match resp_rx.recv().await {
            Some(ChainResponse::Connected { result, .. }) => assert_eq!(result, Err(GateError::NoProvider)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_notes_without_contract_reports_error() {
        let provider = Arc::new(FakeProvider::new().with_fallback(ETH_CALL, Err(ProviderError::Transport("x".into()))));
        let (cmd_tx, mut resp_rx) = spawn_actor(Some(provider.clone()));

        cmd_tx.send(ChainCommand::FetchNotes { epoch: 0 }).unwrap();
        match resp_rx.recv().await {
            Some(ChainResponse::NotesFetched { result: Err(e), .. }) => {
                assert_eq!(e, ContractError::NotConfigured.to_string());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(provider.calls_to(ETH_CALL), 0);
    }
}
