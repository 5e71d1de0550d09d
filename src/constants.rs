//! Application constants
//!
//! Centralized location for chain parameters and configuration defaults.

use std::time::Duration;

/// Chain id of the Sepolia test network, as reported by `eth_chainId`
pub const SEPOLIA_CHAIN_ID: &str = "0xaa36a7";

/// Same chain id as a number, for transaction requests
pub const SEPOLIA_CHAIN_ID_NUM: u64 = 11_155_111;

/// Display name shown when the wallet is on the expected network
pub const SEPOLIA_NAME: &str = "Sepolia";

/// Display name shown for any other network
pub const WRONG_NETWORK_NAME: &str = "Wrong Network";

/// Parameters used when asking the wallet to add Sepolia
pub const SEPOLIA_CHAIN_NAME: &str = "Sepolia Testnet";
pub const SEPOLIA_CURRENCY_NAME: &str = "SepoliaETH";
pub const SEPOLIA_CURRENCY_SYMBOL: &str = "ETH";
pub const SEPOLIA_EXPLORER_URL: &str = "https://sepolia.etherscan.io/";

/// Read-only RPC endpoint used when `SEPOLIA_RPC_URL` is not set
pub const DEFAULT_SEPOLIA_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// Decimal places between one ether and one wei
pub const ETHER_DECIMALS: usize = 18;

/// Gas limit of a plain value transfer
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// How long a copied note keeps its "copied" indicator
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Default interval between wallet account/chain polls
pub const DEFAULT_WALLET_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default interval between receipt polls
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Number of receipt polls before a transaction is reported as unconfirmed
pub const RECEIPT_POLL_ATTEMPTS: u32 = 90;

/// Timeout applied to every JSON-RPC HTTP request
pub const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the parameterless note-listing function
pub const NOTES_LIST_FN: &str = "getNotes";

/// Name of the single-string note-append function
pub const NOTES_APPEND_FN: &str = "addNote";

/// Interface description used when `NOTES_CONTRACT_ABI` is not set
pub const DEFAULT_NOTES_ABI: &str = r#"[
  {
    "type": "function",
    "name": "addNote",
    "inputs": [{ "name": "_note", "type": "string", "internalType": "string" }],
    "outputs": [],
    "stateMutability": "nonpayable"
  },
  {
    "type": "function",
    "name": "getNotes",
    "inputs": [],
    "outputs": [{ "name": "", "type": "string[]", "internalType": "string[]" }],
    "stateMutability": "view"
  }
]"#;

/// Log file written next to the working directory
pub const LOG_FILE_NAME: &str = "wallet-desk.log";

/// Application name
pub const APP_NAME: &str = "Wallet Desk";
