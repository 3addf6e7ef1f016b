//! Encrypted keystore backend
//!
//! Enumerates geth-style V3 key files in a directory and unlocks them
//! with a single configured passphrase (scrypt decryption goes through
//! `alloy`'s keystore support). Decrypted signers are cached so repeated
//! signatures for the same account decrypt at most once.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, SignerSync};
use secrecy::{ExposeSecret, SecretString};

use super::{Account, AccountSource};
use crate::error::{SigningError, UnlockError};

/// Credential backend over a directory of encrypted key files.
///
/// The directory and passphrase are read-only after construction; the
/// only mutable state is the cache of already-decrypted signers.
pub struct KeystoreBackend {
    dir: PathBuf,
    passphrase: SecretString,
    unlocked: Mutex<HashMap<Address, PrivateKeySigner>>,
}

impl KeystoreBackend {
    /// Create a backend over `dir`.
    ///
    /// The directory is not required to exist yet; a missing or empty
    /// directory simply exposes no accounts.
    pub fn new(dir: impl Into<PathBuf>, passphrase: SecretString) -> Self {
        Self {
            dir: dir.into(),
            passphrase,
            unlocked: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Accounts currently discoverable in the directory.
    ///
    /// Re-scans on every call, so files added or removed externally are
    /// reflected. Files that are not parseable key files are skipped.
    pub fn accounts(&self) -> Vec<Account> {
        self.scan()
            .into_iter()
            .map(|(address, path)| Account::new(address, AccountSource::KeyFile(path)))
            .collect()
    }

    /// Decrypt the account's key file and cache the signer.
    pub fn unlock(&self, account: &Account) -> Result<(), UnlockError> {
        let address = account.address();
        let path = self
            .resolve_key_file(account)
            .ok_or(UnlockError::NotFound(address))?;

        let signer = PrivateKeySigner::decrypt_keystore(&path, self.passphrase.expose_secret())
            .map_err(|_| UnlockError::BadPassphrase(address))?;

        // A file whose contents decrypt to a different key does not hold
        // this account.
        if signer.address() != address {
            return Err(UnlockError::NotFound(address));
        }

        self.cache(signer);
        tracing::debug!(account = %address, "unlocked keystore account");
        Ok(())
    }

    pub(crate) fn sign_hash(
        &self,
        account: &Account,
        hash: &B256,
    ) -> Result<Signature, SigningError> {
        let address = account.address();

        let cached = {
            let unlocked = self.lock_cache();
            unlocked.get(&address).cloned()
        };

        let signer = match cached {
            Some(signer) => signer,
            // Not unlocked yet: decrypt on demand with the configured
            // passphrase.
            None => {
                let path = self.resolve_key_file(account).ok_or_else(|| {
                    SigningError::Keystore(format!("no key file found for account {address}"))
                })?;
                let signer =
                    PrivateKeySigner::decrypt_keystore(&path, self.passphrase.expose_secret())
                        .map_err(|e| SigningError::Keystore(e.to_string()))?;
                if signer.address() != address {
                    return Err(SigningError::Keystore(format!(
                        "decrypted key does not match account {address}"
                    )));
                }
                self.cache(signer.clone());
                signer
            }
        };

        signer
            .sign_hash_sync(hash)
            .map_err(|e| SigningError::Keystore(e.to_string()))
    }

    /// Locate the key file for an account, preferring the path recorded
    /// at enumeration time and falling back to a fresh directory scan.
    fn resolve_key_file(&self, account: &Account) -> Option<PathBuf> {
        if let AccountSource::KeyFile(path) = &account.source {
            if read_key_file_address(path) == Some(account.address()) {
                return Some(path.clone());
            }
        }
        self.scan()
            .into_iter()
            .find(|(address, _)| *address == account.address())
            .map(|(_, path)| path)
    }

    /// All (address, key file) pairs in the directory, in path order.
    fn scan(&self) -> Vec<(Address, PathBuf)> {
        let mut found = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(dir = %self.dir.display(), %err, "keystore directory not readable");
                return found;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match read_key_file_address(&path) {
                Some(address) => found.push((address, path)),
                None => {
                    tracing::debug!(file = %path.display(), "skipping non-keystore file");
                }
            }
        }

        found.sort_by(|(_, a), (_, b)| a.cmp(b));
        found
    }

    fn cache(&self, signer: PrivateKeySigner) {
        self.lock_cache().insert(signer.address(), signer);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<Address, PrivateKeySigner>> {
        self.unlocked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// The cache holds decrypted keys and the passphrase is a secret; neither
// belongs in Debug output.
impl std::fmt::Debug for KeystoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreBackend")
            .field("dir", &self.dir)
            .field("passphrase", &"[REDACTED]")
            .field("unlocked", &"[REDACTED]")
            .finish()
    }
}

/// Read the `address` field of a V3 keystore JSON file.
///
/// Returns `None` for anything that is not a key file with a readable
/// address; the caller skips such files.
fn read_key_file_address(path: &Path) -> Option<Address> {
    let data = fs::read_to_string(path).ok()?;
    let json: serde_json::Value = serde_json::from_str(&data).ok()?;
    json.get("address")?.as_str()?.parse().ok()
}
