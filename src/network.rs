//! Network handles
//!
//! A [`NetworkHandle`] binds a network name, a live RPC provider and the
//! credential backend selected for that network. Handles are produced by
//! [`Registry::dial`]; a failed dial is never repaired in place, the
//! caller retries with a fresh call.

use std::fmt;
use std::sync::Arc;

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use url::Url;

use crate::backend::{Account, CredentialBackend, HdWalletBackend, KeystoreBackend};
use crate::config::{NetworkConfig, Registry};
use crate::error::{CredentialError, DialError, UnlockError};
use crate::signer::AccountSigner;

/// A dialed network: name, RPC transport and one credential backend.
pub struct NetworkHandle {
    name: String,
    provider: DynProvider,
    backend: Arc<CredentialBackend>,
}

impl Registry {
    /// Construct a [`NetworkHandle`] for the named network.
    ///
    /// Resolves the configuration, connects the RPC transport, selects
    /// the credential backend (keystore takes priority when both are
    /// configured) and verifies that at least one account is available.
    pub async fn dial(&self, name: &str) -> Result<NetworkHandle, DialError> {
        let config = self
            .get(name)
            .ok_or_else(|| DialError::UnknownNetwork(name.to_string()))?;

        let url: Url = config.url().parse().map_err(|e: url::ParseError| {
            DialError::ConnectionFailed {
                url: config.url().to_string(),
                reason: e.to_string(),
            }
        })?;
        let provider = ProviderBuilder::new()
            .connect(url.as_str())
            .await
            .map_err(|e| DialError::ConnectionFailed {
                url: config.url().to_string(),
                reason: e.to_string(),
            })?
            .erased();

        let backend = select_backend(config).map_err(|source| DialError::CredentialInitFailed {
            network: name.to_string(),
            source,
        })?;
        let backend = Arc::new(backend);

        // A backend with zero usable accounts is not a valid handle.
        let accounts = backend.accounts();
        if accounts.is_empty() {
            return Err(DialError::NoAccounts(name.to_string()));
        }

        tracing::info!(
            network = name,
            url = config.url(),
            accounts = accounts.len(),
            "dialed network"
        );

        Ok(NetworkHandle {
            name: name.to_string(),
            provider,
            backend,
        })
    }
}

/// Pick the credential backend for a network.
///
/// Mutually exclusive by construction: a keystore directory wins over a
/// mnemonic, and configuring neither is an error.
fn select_backend(config: &NetworkConfig) -> Result<CredentialBackend, CredentialError> {
    if let Some(dir) = config.keystore_dir() {
        let passphrase = config
            .passphrase()
            .cloned()
            .ok_or(CredentialError::MissingPassphrase)?;
        return Ok(CredentialBackend::Keystore(KeystoreBackend::new(
            dir, passphrase,
        )));
    }

    if let Some(mnemonic) = config.mnemonic() {
        let backend = HdWalletBackend::new(mnemonic, config.num_accounts())?;
        return Ok(CredentialBackend::HdWallet(backend));
    }

    Err(CredentialError::NoCredentialSource)
}

impl NetworkHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The RPC provider, for sending signed transactions and querying
    /// chain state. Opaque to this crate.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Accounts exposed by the active credential backend.
    pub fn accounts(&self) -> Vec<Account> {
        self.backend.accounts()
    }

    /// Unlock an account for signing. A no-op for HD wallet networks.
    pub fn unlock(&self, account: &Account) -> Result<(), UnlockError> {
        self.backend.unlock(account)
    }

    /// A signer bound to exactly one account.
    pub fn signer(&self, account: Account) -> AccountSigner {
        AccountSigner::new(Arc::clone(&self.backend), account)
    }
}

impl fmt::Debug for NetworkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkHandle")
            .field("name", &self.name)
            .field("backend", &*self.backend)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use secrecy::SecretString;
    use tempfile::TempDir;

    const TEST_MNEMONIC: &str =
        "test test test test test test test test test test test junk";

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn mnemonic_network(name: &str, count: usize) -> NetworkConfig {
        NetworkConfig::new(name, "http://localhost:8545")
            .with_mnemonic(secret(TEST_MNEMONIC), count)
    }

    #[tokio::test]
    async fn dial_unknown_network_fails() {
        let registry = Registry::from_configs([mnemonic_network("dev", 1)]);
        let err = registry.dial("mainnet").await.unwrap_err();
        assert!(matches!(err, DialError::UnknownNetwork(name) if name == "mainnet"));
    }

    #[tokio::test]
    async fn dial_with_unparseable_url_fails() {
        let registry = Registry::from_configs([
            NetworkConfig::new("dev", "not a url").with_mnemonic(secret(TEST_MNEMONIC), 1),
        ]);
        let err = registry.dial("dev").await.unwrap_err();
        assert!(matches!(err, DialError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn dial_mnemonic_network_derives_accounts() {
        let registry = Registry::from_configs([mnemonic_network("dev", 3)]);
        let handle = registry.dial("dev").await.unwrap();

        assert_eq!(handle.name(), "dev");
        let accounts = handle.accounts();
        assert_eq!(accounts.len(), 3);
        assert_eq!(
            accounts[0].address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[tokio::test]
    async fn dial_without_credentials_fails() {
        let registry = Registry::from_configs([NetworkConfig::new("dev", "http://localhost:8545")]);
        let err = registry.dial("dev").await.unwrap_err();
        assert!(matches!(
            err,
            DialError::CredentialInitFailed {
                source: CredentialError::NoCredentialSource,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn dial_keystore_without_passphrase_fails() {
        let dir = TempDir::new().unwrap();
        // A source that sets the directory but omits the passphrase.
        let registry = Registry::from_reader(
            format!(
                r#"{{"dev": {{"url": "http://localhost:8545", "keystore": {:?}}}}}"#,
                dir.path().to_str().unwrap()
            )
            .as_bytes(),
        )
        .unwrap();

        let err = registry.dial("dev").await.unwrap_err();
        assert!(matches!(
            err,
            DialError::CredentialInitFailed {
                source: CredentialError::MissingPassphrase,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn dial_keystore_with_empty_passphrase_fails() {
        let dir = TempDir::new().unwrap();
        // An empty passphrase string means "not configured", so the
        // misconfiguration surfaces at dial rather than later at unlock.
        let registry = Registry::from_reader(
            format!(
                r#"{{"dev": {{"url": "http://localhost:8545", "keystore": {:?}, "passphrase": ""}}}}"#,
                dir.path().to_str().unwrap()
            )
            .as_bytes(),
        )
        .unwrap();

        let err = registry.dial("dev").await.unwrap_err();
        assert!(matches!(
            err,
            DialError::CredentialInitFailed {
                source: CredentialError::MissingPassphrase,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn dial_empty_keystore_directory_is_no_accounts() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::from_configs([
            NetworkConfig::new("dev", "http://localhost:8545")
                .with_keystore(dir.path(), secret("pw")),
        ]);
        let err = registry.dial("dev").await.unwrap_err();
        assert!(matches!(err, DialError::NoAccounts(name) if name == "dev"));
    }

    #[tokio::test]
    async fn dial_with_bad_mnemonic_fails() {
        let registry = Registry::from_configs([
            NetworkConfig::new("dev", "http://localhost:8545")
                .with_mnemonic(secret("not a real phrase"), 2),
        ]);
        let err = registry.dial("dev").await.unwrap_err();
        assert!(matches!(
            err,
            DialError::CredentialInitFailed {
                source: CredentialError::Mnemonic(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_num_accounts_defaults_to_ten() {
        let registry = Registry::from_reader(
            format!(
                r#"{{"dev": {{"url": "http://localhost:8545", "mnemonic": {TEST_MNEMONIC:?}, "num_accounts": "abc"}}}}"#
            )
            .as_bytes(),
        )
        .unwrap();

        let handle = registry.dial("dev").await.unwrap();
        assert_eq!(handle.accounts().len(), 10);
    }

    #[tokio::test]
    async fn keystore_wins_when_both_sources_configured() {
        let dir = TempDir::new().unwrap();
        let config = NetworkConfig::new("dev", "http://localhost:8545")
            .with_keystore(dir.path(), secret("pw"))
            .with_mnemonic(secret(TEST_MNEMONIC), 3);
        let registry = Registry::from_configs([config]);

        // The empty keystore directory is selected over the mnemonic, so
        // the dial reports NoAccounts instead of deriving HD accounts.
        let err = registry.dial("dev").await.unwrap_err();
        assert!(matches!(err, DialError::NoAccounts(_)));
    }

    #[tokio::test]
    async fn unlock_is_a_no_op_for_hd_networks() {
        let registry = Registry::from_configs([mnemonic_network("dev", 1)]);
        let handle = registry.dial("dev").await.unwrap();
        let account = handle.accounts().remove(0);
        handle.unlock(&account).unwrap();
    }
}
