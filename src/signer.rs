//! Per-account signing capability
//!
//! An [`AccountSigner`] is bound to exactly one account at construction
//! and dispatches to the credential backend that owns its key. The
//! authorization check lives here, in one auditable place: every call
//! verifies the claimed sender address before any key material is
//! touched.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Address, B256};
use alloy::signers::Signature;

use crate::backend::{Account, CredentialBackend};
use crate::error::SigningError;

/// A signing capability bound to one account.
///
/// Callable repeatedly with different transaction hashes; calls are
/// independent and unrelated accounts may sign concurrently.
pub struct AccountSigner {
    backend: Arc<CredentialBackend>,
    account: Account,
}

impl AccountSigner {
    pub(crate) fn new(backend: Arc<CredentialBackend>, account: Account) -> Self {
        Self { backend, account }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// The only address this signer will ever sign for.
    pub fn address(&self) -> Address {
        self.account.address()
    }

    /// Produce a recoverable ECDSA signature over `hash`.
    ///
    /// `claimed_address` is the address the transaction claims to be sent
    /// from. It must equal the bound account's address; a mismatch fails
    /// with [`SigningError::UnauthorizedAccount`] without touching any
    /// key material. The check runs on every invocation, not only at
    /// construction.
    pub fn sign_hash(
        &self,
        hash: &B256,
        claimed_address: Address,
    ) -> Result<Signature, SigningError> {
        if claimed_address != self.account.address() {
            return Err(SigningError::UnauthorizedAccount {
                bound: self.account.address(),
                requested: claimed_address,
            });
        }

        self.backend.sign_hash(&self.account, hash)
    }
}

impl fmt::Debug for AccountSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSigner")
            .field("account", &self.account.address())
            .field("backend", &"[REDACTED]")
            .finish()
    }
}
