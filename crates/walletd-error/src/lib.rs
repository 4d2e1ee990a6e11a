//! # WalletD Error
//!
//! Error types shared by the token studio crates. Errors fall into four
//! families that are handled differently by callers:
//!
//! - [`StorageError`] - durable store read/write/serialize failures. The
//!   token registry logs these and degrades; they never reach the UI.
//! - [`ValidationError`] - malformed addresses, supplies or import records.
//! - [`WalletError`] - wallet bridge failures surfaced to the user.
//! - [`ContractError`] - contract call failures, classified into a
//!   user-facing message by [`ContractError::user_message`].
//!
//! ## Example
//!
//! ```
//! use walletd_error::ContractError;
//!
//! let err = ContractError::from_raw("insufficient funds for gas * price + value");
//! assert_eq!(err.user_message(), "Insufficient funds to pay for this transaction");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

/// EIP-1193 code for a request the user rejected in the wallet.
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 code for a chain the wallet does not know about.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

// ============================================================================
// Storage
// ============================================================================

/// Failures against the durable key-value store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading a key failed
    #[error("Failed to read '{key}': {reason}")]
    Read {
        /// Store key
        key: String,
        /// Error reason
        reason: String,
    },

    /// Writing a key failed
    #[error("Failed to write '{key}': {reason}")]
    Write {
        /// Store key
        key: String,
        /// Error reason
        reason: String,
    },

    /// A stored document could not be encoded or decoded
    #[error("Corrupt document under '{key}': {reason}")]
    Serialization {
        /// Store key
        key: String,
        /// Error reason
        reason: String,
    },
}

// ============================================================================
// Validation
// ============================================================================

/// Rejections of malformed input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is not `0x` followed by 40 hex digits
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The rejected input
        address: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Decimals outside of 0..=18
    #[error("Decimals must be between 0 and 18, got {0}")]
    DecimalsOutOfRange(u64),

    /// Supply is not a non-negative decimal integer that fits in uint256
    #[error("Invalid supply '{0}': expected a decimal integer")]
    InvalidSupply(String),

    /// A required field is missing or has the wrong type
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// Error reason
        reason: String,
    },

    /// Import document is unusable as a whole
    #[error("Invalid import document: {0}")]
    InvalidDocument(String),
}

// ============================================================================
// Wallet
// ============================================================================

/// Wallet bridge and session errors. Display strings are the messages shown
/// to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// No wallet bridge is available
    #[error("No wallet detected. Please install a browser wallet such as MetaMask")]
    NotInstalled,

    /// The user rejected the request in the wallet
    #[error("Request rejected in wallet")]
    UserRejected,

    /// The wallet returned no accounts
    #[error("No accounts available in wallet")]
    NoAccounts,

    /// The wallet does not know the requested chain
    #[error("Network {chain_id} is not configured in the wallet")]
    UnrecognizedChain {
        /// Requested chain id
        chain_id: u64,
    },

    /// The wallet stayed on another chain after a switch
    #[error("Please switch to {expected_name} (chain {expected}); wallet is on chain {got}")]
    WrongNetwork {
        /// Target chain id
        expected: u64,
        /// Target network name
        expected_name: String,
        /// Chain id the wallet reports
        got: u64,
    },

    /// The session has no connected account
    #[error("Wallet not connected")]
    NotConnected,

    /// Provider/RPC failure reported by the bridge
    #[error("Wallet provider error ({code}): {message}")]
    Provider {
        /// JSON-RPC or EIP-1193 error code
        code: i64,
        /// Error message
        message: String,
    },
}

impl WalletError {
    /// Maps an EIP-1193 error code and message onto a wallet error.
    pub fn from_code(code: i64, message: impl Into<String>, chain_id: Option<u64>) -> Self {
        match (code, chain_id) {
            (USER_REJECTED_CODE, _) => WalletError::UserRejected,
            (UNRECOGNIZED_CHAIN_CODE, Some(chain_id)) => WalletError::UnrecognizedChain { chain_id },
            _ => WalletError::Provider {
                code,
                message: message.into(),
            },
        }
    }
}

// ============================================================================
// Contract
// ============================================================================

/// Contract call failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Transaction rejected by the user
    #[error("Transaction rejected by user")]
    Rejected,

    /// Sender cannot cover value plus gas
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Gas estimation failed, usually because the call would revert
    #[error("Gas estimation failed: {0}")]
    GasEstimation(String),

    /// Execution reverted
    #[error("Execution reverted: {0}")]
    Reverted(String),

    /// ABI encoding/decoding error
    #[error("ABI error: {0}")]
    Abi(String),

    /// Transport or provider failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// Receipt did not contain the expected event
    #[error("Missing event in receipt: {0}")]
    MissingEvent(String),

    /// No signer is available for a write
    #[error("A connected wallet is required to send transactions")]
    NoSigner,

    /// Gateway is not configured (e.g. no factory address)
    #[error("Contract gateway not configured: {0}")]
    NotConfigured(String),

    /// Any other failure, carrying the raw message
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Classifies a raw error string coming back from a provider or node.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let lower = raw.to_lowercase();

        if lower.contains("user rejected")
            || lower.contains("user denied")
            || lower.contains("action_rejected")
            || lower.contains(&format!("code: {USER_REJECTED_CODE}"))
        {
            ContractError::Rejected
        } else if lower.contains("insufficient funds") {
            ContractError::InsufficientFunds(raw)
        } else if lower.contains("gas required exceeds")
            || lower.contains("unpredictable_gas_limit")
            || lower.contains("cannot estimate gas")
        {
            ContractError::GasEstimation(raw)
        } else if let Some(reason) = revert_reason(&raw) {
            ContractError::Reverted(reason)
        } else {
            ContractError::Other(raw)
        }
    }

    /// Message suitable for display. Known failure shapes get a fixed
    /// wording; anything else passes the raw message through.
    pub fn user_message(&self) -> String {
        match self {
            ContractError::Rejected => "Transaction was rejected in your wallet".to_string(),
            ContractError::InsufficientFunds(_) => {
                "Insufficient funds to pay for this transaction".to_string()
            }
            ContractError::GasEstimation(raw) => match known_revert(raw) {
                Some(message) => message.to_string(),
                None => "Transaction would fail: gas estimation failed".to_string(),
            },
            ContractError::Reverted(reason) => match known_revert(reason) {
                Some(message) => message.to_string(),
                None => format!("Transaction reverted: {reason}"),
            },
            ContractError::NoSigner => self.to_string(),
            other => {
                let raw = other.to_string();
                known_revert(&raw).map(str::to_string).unwrap_or(raw)
            }
        }
    }
}

/// Extracts the reason from an `execution reverted: <reason>` message.
fn revert_reason(raw: &str) -> Option<String> {
    // ASCII lowering keeps byte offsets aligned with `raw`
    let lower = raw.to_ascii_lowercase();
    let idx = lower.find("execution reverted")?;
    let rest = raw[idx + "execution reverted".len()..]
        .trim_start_matches(':')
        .trim();
    if rest.is_empty() {
        Some("no reason given".to_string())
    } else {
        Some(rest.trim_matches('"').to_string())
    }
}

/// Revert reasons the token contracts are known to produce.
fn known_revert(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    if lower.contains("accesscontrol") || lower.contains("missing role") {
        Some("Your account does not have the required role for this action")
    } else if lower.contains("enforcedpause") || lower.contains("pausable: paused") {
        Some("Token transfers are paused")
    } else if lower.contains("max supply") || lower.contains("exceedsmaxsupply") {
        Some("Amount would exceed the token's maximum supply")
    } else if lower.contains("insufficient creation fee") || lower.contains("insufficientfee") {
        Some("The creation fee was not paid in full")
    } else if lower.contains("erc20insufficientbalance") || lower.contains("transfer amount exceeds balance") {
        Some("Token balance is too low for this amount")
    } else {
        None
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<WalletError> for ContractError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::UserRejected => ContractError::Rejected,
            WalletError::NotConnected | WalletError::NotInstalled => ContractError::NoSigner,
            other => ContractError::Provider(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        ValidationError::InvalidDocument(err.to_string())
    }
}
