//! Credential backends
//!
//! A network handle owns exactly one credential backend: either an
//! encrypted on-disk keystore or an HD wallet derived from a mnemonic.
//! The backend is the ONLY place secret material (encrypted key bytes,
//! mnemonic, passphrase, decrypted keys) is handled.
//!
//! Backends expose the same three operations: enumerate accounts, unlock
//! an account, and sign a hash for an account. Callers must tolerate one
//! asymmetry: unlocking an HD wallet account is a no-op because signing
//! re-derives the key rather than depending on a prior unlock.

mod hd;
mod keystore;

pub use hd::{HdWalletBackend, DERIVATION_PATH_PREFIX};
pub use keystore::KeystoreBackend;

use std::path::PathBuf;

use alloy::primitives::{Address, B256};
use alloy::signers::Signature;

use crate::error::{SigningError, UnlockError};

/// Where an account's key material lives within its owning backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AccountSource {
    /// Path to the encrypted V3 key file.
    KeyFile(PathBuf),
    /// Index `i` under `m/44'/60'/0'/0/i`.
    DerivationIndex(u32),
}

/// A signing account exposed by a credential backend.
///
/// Plain value object: carries the public address and an opaque reference
/// into the owning backend, never any key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    address: Address,
    pub(crate) source: AccountSource,
}

impl Account {
    pub(crate) fn new(address: Address, source: AccountSource) -> Self {
        Self { address, source }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// The credential source behind one network handle.
///
/// Exactly one variant is active per handle, selected once at dial time
/// and never mixed.
pub enum CredentialBackend {
    Keystore(KeystoreBackend),
    HdWallet(HdWalletBackend),
}

impl CredentialBackend {
    /// All accounts this backend can sign for.
    ///
    /// The keystore variant re-scans its directory on every call and so
    /// reflects external changes; the HD variant returns its derived
    /// accounts in derivation-index order, index 0 first.
    pub fn accounts(&self) -> Vec<Account> {
        match self {
            Self::Keystore(ks) => ks.accounts(),
            Self::HdWallet(hd) => hd.accounts(),
        }
    }

    /// Decrypt the account's key material so it is ready for signing.
    ///
    /// Only meaningful for the keystore variant. For an HD wallet this
    /// always succeeds without doing anything: the key is re-derived at
    /// signing time, it is never "locked" at rest.
    pub fn unlock(&self, account: &Account) -> Result<(), UnlockError> {
        match self {
            Self::Keystore(ks) => ks.unlock(account),
            Self::HdWallet(_) => Ok(()),
        }
    }

    /// Sign `hash` with the account's key.
    ///
    /// The cross-sign guard lives in [`AccountSigner`](crate::AccountSigner);
    /// this method still verifies that the resolved key matches the
    /// account before returning a signature.
    pub(crate) fn sign_hash(
        &self,
        account: &Account,
        hash: &B256,
    ) -> Result<Signature, SigningError> {
        match self {
            Self::Keystore(ks) => ks.sign_hash(account, hash),
            Self::HdWallet(hd) => hd.sign_hash(account, hash),
        }
    }
}

impl std::fmt::Debug for CredentialBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keystore(ks) => ks.fmt(f),
            Self::HdWallet(hd) => hd.fmt(f),
        }
    }
}
