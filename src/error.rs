//! Error types for network resolution and signing

use alloy::primitives::Address;
use thiserror::Error;

/// Failure to read the network configuration source at all.
///
/// Fatal to startup; individual network problems (bad URL, missing
/// keystore) surface later from [`DialError`] instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read network configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed network configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to construct a network handle.
///
/// Each variant is fatal to that one dial attempt only; other networks
/// are unaffected and the caller may retry with a fresh dial.
#[derive(Error, Debug)]
pub enum DialError {
    #[error("no such network {0}")]
    UnknownNetwork(String),

    #[error("failed to connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("credential initialization failed for network {network}: {source}")]
    CredentialInitFailed {
        network: String,
        #[source]
        source: CredentialError,
    },

    #[error("no accounts available for network {0}, check the keystore directory or mnemonic")]
    NoAccounts(String),
}

/// Why a credential backend could not be constructed.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("keystore directory is configured but no passphrase is set")]
    MissingPassphrase,

    #[error("mnemonic rejected or key derivation failed: {0}")]
    Mnemonic(String),

    #[error("neither a keystore directory nor a mnemonic is configured")]
    NoCredentialSource,
}

/// Failure to unlock a keystore account.
///
/// Recoverable: the caller may retry with corrected input.
#[derive(Error, Debug)]
pub enum UnlockError {
    #[error("bad passphrase for account {0}")]
    BadPassphrase(Address),

    #[error("no key file found for account {0}")]
    NotFound(Address),
}

/// Failure to produce a transaction signature.
#[derive(Error, Debug)]
pub enum SigningError {
    /// The claimed sender does not match the account the signer is bound
    /// to. Returned before any key material is touched.
    #[error("not authorized to sign for {requested}, signer is bound to {bound}")]
    UnauthorizedAccount { bound: Address, requested: Address },

    #[error("keystore signing failed: {0}")]
    Keystore(String),

    #[error("key derivation failed: {0}")]
    Derivation(String),

    /// Reserved for callers that bound a signing call with an external
    /// timeout; never produced by this crate itself.
    #[error("signing timed out")]
    Timeout,
}
