//! Hierarchical-deterministic wallet backend
//!
//! Derives N accounts from a BIP-39 mnemonic along the standard Ethereum
//! path `m/44'/60'/0'/0/i` and keeps the derived signers cached for the
//! life of the backend. Derivation happens eagerly at construction, so a
//! bad mnemonic fails the dial rather than the first signature.

use alloy::primitives::B256;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use alloy::signers::{Signature, SignerSync};
use secrecy::{ExposeSecret, SecretString};

use super::{Account, AccountSource};
use crate::error::{CredentialError, SigningError};

/// Derivation path template; the account index is appended.
pub const DERIVATION_PATH_PREFIX: &str = "m/44'/60'/0'/0/";

/// Credential backend deriving accounts on demand from a mnemonic.
///
/// There is no unlock step: once constructed, every derived account is
/// immediately signing-capable.
pub struct HdWalletBackend {
    /// Derived signers in derivation-index order, index 0 first.
    derived: Vec<PrivateKeySigner>,
}

impl HdWalletBackend {
    /// Derive accounts `0..count` from `mnemonic`.
    ///
    /// The account set is deterministic: the same mnemonic always yields
    /// the same addresses in the same order.
    pub fn new(mnemonic: &SecretString, count: usize) -> Result<Self, CredentialError> {
        let mut derived = Vec::with_capacity(count);
        for index in 0..count {
            let signer = MnemonicBuilder::<English>::default()
                .phrase(mnemonic.expose_secret())
                .derivation_path(format!("{DERIVATION_PATH_PREFIX}{index}"))
                .map_err(|e| CredentialError::Mnemonic(e.to_string()))?
                .build()
                .map_err(|e| CredentialError::Mnemonic(e.to_string()))?;
            derived.push(signer);
        }
        tracing::debug!(accounts = derived.len(), "derived HD wallet accounts");
        Ok(Self { derived })
    }

    /// The derived accounts, index 0 first.
    pub fn accounts(&self) -> Vec<Account> {
        self.derived
            .iter()
            .enumerate()
            .map(|(i, signer)| {
                Account::new(signer.address(), AccountSource::DerivationIndex(i as u32))
            })
            .collect()
    }

    pub(crate) fn sign_hash(
        &self,
        account: &Account,
        hash: &B256,
    ) -> Result<Signature, SigningError> {
        let AccountSource::DerivationIndex(index) = account.source else {
            return Err(SigningError::Derivation(format!(
                "account {} does not belong to an HD wallet backend",
                account.address()
            )));
        };

        let signer = self.derived.get(index as usize).ok_or_else(|| {
            SigningError::Derivation(format!(
                "no key derived at index {index} for account {}",
                account.address()
            ))
        })?;

        // The index and the address must agree before the key is used.
        if signer.address() != account.address() {
            return Err(SigningError::Derivation(format!(
                "key at index {index} does not match account {}",
                account.address()
            )));
        }

        signer
            .sign_hash_sync(hash)
            .map_err(|e| SigningError::Derivation(e.to_string()))
    }
}

// Derived signers hold private keys; keep them out of Debug output.
impl std::fmt::Debug for HdWalletBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdWalletBackend")
            .field("accounts", &self.derived.len())
            .field("keys", &"[REDACTED]")
            .finish()
    }
}
