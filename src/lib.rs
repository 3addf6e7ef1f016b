//! Named blockchain network resolution for deployment tooling
//!
//! Maps network names to RPC endpoints and credential sources, and hands
//! out per-account signing capabilities without the caller knowing
//! whether a key lives in an encrypted keystore directory or is derived
//! from a mnemonic:
//!
//! 1. Build a [`Registry`] from a configuration source (once, at startup)
//! 2. [`Registry::dial`] a network to get a [`NetworkHandle`] with a live
//!    provider and exactly one credential backend
//! 3. List [`NetworkHandle::accounts`], unlock if needed, and request a
//!    [`NetworkHandle::signer`] bound to one account
//! 4. Call [`AccountSigner::sign_hash`] per transaction hash
//!
//! # Security Model
//!
//! - Secret material (passphrases, mnemonics, decrypted keys) lives only
//!   inside the credential backends and is redacted from `Debug` output
//! - A signer is bound to one account and verifies the claimed sender on
//!   every call before touching key material, so it can never cross-sign
//! - Errors are surfaced, never swallowed into defaults, for unlock and
//!   signing; the only documented fallback is the account-count default
//!
//! Transaction construction (nonce, gas, value) stays with the caller;
//! this crate stops at producing a signature over a supplied hash.

pub mod backend;
pub mod config;
pub mod network;
pub mod signer;

mod error;

// Re-export commonly used types
pub use backend::{
    Account, CredentialBackend, HdWalletBackend, KeystoreBackend, DERIVATION_PATH_PREFIX,
};
pub use config::{NetworkConfig, Registry, DEFAULT_ACCOUNT_COUNT};
pub use error::{ConfigError, CredentialError, DialError, SigningError, UnlockError};
pub use network::NetworkHandle;
pub use signer::AccountSigner;
