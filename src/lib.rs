//! # Wallet Desk
//!
//! Terminal front-ends for an EIP-1193 wallet on Sepolia.
//!
//! ## Features
//! - Send tab: transfer Sepolia ETH with address/amount validation
//! - Notes tab: read and append notes on a deployed contract
//! - Wallet connection gate, network check and switch, balance display
//! - Copy notes to the system clipboard
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Chain Layer (Tokio runtime)

pub mod constants;
pub mod config;
pub mod models;
pub mod ui;
pub mod clipboard;
pub mod messages;
pub mod app;
pub mod chain;

// Re-export commonly used types
pub use models::{Network, Note, Session, TransferRequest, ValidTransfer};
pub use config::Config;
pub use messages::{UiEvent, ChainCommand, ChainResponse, RenderState};
pub use app::{AppState, AppActor};
pub use chain::ChainActor;
