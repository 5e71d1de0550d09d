//! View-level data: wallet session, transfer form, notes.
//!
//! Nothing here is persisted. A [`Session`] lives only as long as the tab
//! that owns it, and the note list is a snapshot of what the contract
//! returned on the last fetch.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::utils::parse_ether;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::constants::{ETHER_DECIMALS, SEPOLIA_CHAIN_ID, SEPOLIA_NAME, WRONG_NETWORK_NAME};

/// Network the wallet reports, classified against Sepolia
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Network {
    #[default]
    Unknown,
    Expected,
    /// Any other chain, holding the id the wallet reported
    Wrong(String),
}

impl Network {
    pub fn from_chain_id(chain_id: &str) -> Network {
        if chain_id.trim().eq_ignore_ascii_case(SEPOLIA_CHAIN_ID) {
            Network::Expected
        } else {
            Network::Wrong(chain_id.trim().to_string())
        }
    }

    pub fn is_expected(&self) -> bool {
        matches!(self, Network::Expected)
    }

    pub fn display_name(&self) -> &str {
        match self {
            Network::Unknown => "Unknown",
            Network::Expected => SEPOLIA_NAME,
            Network::Wrong(_) => WRONG_NETWORK_NAME,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Wallet session as seen by one tab
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Session {
    pub account: Option<Address>,
    pub network: Network,
}

impl Session {
    pub fn disconnected() -> Self {
        Session::default()
    }

    pub fn new(account: Option<Address>, network: Network) -> Self {
        Session { account, network }
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// Apply an `accountsChanged` payload: first account wins, empty list disconnects
    pub fn apply_accounts(&mut self, accounts: &[Address]) {
        self.account = accounts.first().copied();
    }
}

/// Why a transfer form was rejected before reaching the provider
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("Please connect your wallet first")]
    NotConnected,
    #[error("Please switch to the Sepolia network in your wallet")]
    WrongNetwork,
    #[error("Please enter a valid recipient address")]
    InvalidRecipient,
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Amount cannot have more than 18 decimal places")]
    TooPrecise,
}

/// Send form contents, exactly as typed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferRequest {
    pub recipient: String,
    pub amount: String,
}

/// A transfer that passed every client-side check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidTransfer {
    pub from: Address,
    pub to: Address,
    /// Amount in wei
    pub value: U256,
}

impl TransferRequest {
    pub fn new(recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        TransferRequest {
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    /// Check the form against the session. Session checks run first so a
    /// disconnected or misconfigured wallet is reported before typos.
    pub fn validate(&self, session: &Session) -> Result<ValidTransfer, TransferError> {
        let from = session.account.ok_or(TransferError::NotConnected)?;
        if !session.network.is_expected() {
            return Err(TransferError::WrongNetwork);
        }

        let recipient = self.recipient.trim();
        if recipient.is_empty() {
            return Err(TransferError::InvalidRecipient);
        }
        let to = Address::from_str(recipient).map_err(|_| TransferError::InvalidRecipient)?;

        let value = parse_amount(&self.amount)?;
        Ok(ValidTransfer { from, to, value })
    }
}

/// Parse a decimal ether amount into wei, rejecting zero and negatives.
///
/// Accepts an optional leading `+` and forms like `.5` or `5.`. Exponent
/// notation and hex are rejected, as is anything finer than one wei.
pub fn parse_amount(amount: &str) -> Result<U256, TransferError> {
    let amount = amount.trim();
    let amount = amount.strip_prefix('+').unwrap_or(amount);
    if amount.starts_with('-') {
        return Err(TransferError::NonPositiveAmount);
    }
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(TransferError::InvalidAmount);
    }
    if fraction.len() > ETHER_DECIMALS {
        return Err(TransferError::TooPrecise);
    }
    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if fraction.is_empty() { whole.to_string() } else { format!("{whole}.{fraction}") };
    let value = parse_ether(&normalized).map_err(|_| TransferError::InvalidAmount)?;
    if value.is_zero() {
        return Err(TransferError::NonPositiveAmount);
    }
    Ok(value)
}

/// A note as stored by the contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
}

impl Note {
    pub fn new(text: impl Into<String>) -> Self {
        Note { text: text.into() }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// `0x1234...abcd` form of an address for compact headers
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
