//! Network configuration registry
//!
//! Holds, per network name, the raw fields needed to construct a network
//! handle: RPC endpoint, optional keystore directory and passphrase,
//! optional mnemonic and account count. The registry is built once from a
//! configuration source and is read-only afterwards; pass it by reference
//! to wherever handles are dialed.
//!
//! Nothing here touches the network or the filesystem beyond reading the
//! configuration source itself. Unreachable URLs and missing keystore
//! directories only surface later, at dial time.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::ConfigError;

/// Number of accounts derived from a mnemonic when `num_accounts` is
/// absent or unparseable.
pub const DEFAULT_ACCOUNT_COUNT: usize = 10;

/// Per-network fields as they appear in the configuration source.
///
/// Every field is optional; absence means "not configured", not an error.
/// `num_accounts` arrives as a string because the source format keeps all
/// values stringly typed.
#[derive(Debug, Default, Deserialize)]
struct RawNetworkConfig {
    url: Option<String>,
    keystore: Option<String>,
    passphrase: Option<SecretString>,
    mnemonic: Option<SecretString>,
    num_accounts: Option<String>,
}

/// Immutable configuration for one named network.
///
/// Secrets are held as [`SecretString`] so they are redacted from `Debug`
/// output and zeroized on drop.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    name: String,
    url: String,
    keystore_dir: Option<PathBuf>,
    passphrase: Option<SecretString>,
    mnemonic: Option<SecretString>,
    num_accounts: usize,
}

impl NetworkConfig {
    /// Create a configuration with just an endpoint URL.
    ///
    /// Without a keystore or mnemonic the network cannot be dialed; add a
    /// credential source with [`with_keystore`](Self::with_keystore) or
    /// [`with_mnemonic`](Self::with_mnemonic).
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            keystore_dir: None,
            passphrase: None,
            mnemonic: None,
            num_accounts: DEFAULT_ACCOUNT_COUNT,
        }
    }

    /// Configure an encrypted keystore directory and its passphrase.
    pub fn with_keystore(mut self, dir: impl Into<PathBuf>, passphrase: SecretString) -> Self {
        self.keystore_dir = Some(dir.into());
        self.passphrase = Some(passphrase);
        self
    }

    /// Configure a mnemonic from which `num_accounts` accounts are derived.
    pub fn with_mnemonic(mut self, mnemonic: SecretString, num_accounts: usize) -> Self {
        self.mnemonic = Some(mnemonic);
        self.num_accounts = num_accounts;
        self
    }

    fn from_raw(name: String, raw: RawNetworkConfig) -> Self {
        let mnemonic = raw
            .mnemonic
            .filter(|m| !m.expose_secret().is_empty());

        // Malformed account counts fall back to the default rather than
        // failing the whole load; the substitution is logged so it cannot
        // be mistaken for an explicit setting.
        let num_accounts = match raw.num_accounts.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_ACCOUNT_COUNT,
            Some(s) => s.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    network = %name,
                    value = s,
                    "unparseable num_accounts, defaulting to {DEFAULT_ACCOUNT_COUNT}"
                );
                DEFAULT_ACCOUNT_COUNT
            }),
        };

        Self {
            name,
            url: raw.url.unwrap_or_default(),
            keystore_dir: raw
                .keystore
                .filter(|k| !k.is_empty())
                .map(PathBuf::from),
            passphrase: raw
                .passphrase
                .filter(|p| !p.expose_secret().is_empty()),
            mnemonic,
            num_accounts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The RPC endpoint URL. May be empty if the source omitted it, in
    /// which case dialing fails with a connection error.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn keystore_dir(&self) -> Option<&Path> {
        self.keystore_dir.as_deref()
    }

    /// Number of accounts to derive when a mnemonic is configured.
    pub fn num_accounts(&self) -> usize {
        self.num_accounts
    }

    pub(crate) fn passphrase(&self) -> Option<&SecretString> {
        self.passphrase.as_ref()
    }

    pub(crate) fn mnemonic(&self) -> Option<&SecretString> {
        self.mnemonic.as_ref()
    }
}

/// Read-only mapping from network name to [`NetworkConfig`].
///
/// Built once at startup and passed by reference afterwards; multiple
/// registries can coexist (useful in tests), there is no process-wide
/// state.
#[derive(Debug, Default)]
pub struct Registry {
    networks: HashMap<String, NetworkConfig>,
}

impl Registry {
    /// Load the registry from a JSON file mapping network name to raw
    /// string fields `url`, `keystore`, `passphrase`, `mnemonic` and
    /// `num_accounts`.
    ///
    /// Fails only if the file cannot be read or parsed as a whole;
    /// per-network misconfiguration surfaces at dial time.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load the registry from any reader producing the same JSON mapping.
    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigError> {
        let raw: HashMap<String, RawNetworkConfig> = serde_json::from_reader(reader)?;
        let networks = raw
            .into_iter()
            .map(|(name, fields)| {
                let config = NetworkConfig::from_raw(name.clone(), fields);
                (name, config)
            })
            .collect();
        Ok(Self { networks })
    }

    /// Assemble a registry from already-built configurations.
    pub fn from_configs(configs: impl IntoIterator<Item = NetworkConfig>) -> Self {
        Self {
            networks: configs
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&NetworkConfig> {
        self.networks.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Registry {
        Registry::from_reader(json.as_bytes()).expect("parse registry")
    }

    #[test]
    fn parses_all_fields() {
        let registry = parse(
            r#"{
                "ropsten": {
                    "url": "http://localhost:8545",
                    "keystore": "/keys/ropsten",
                    "passphrase": "hunter2"
                },
                "dev": {
                    "url": "ws://localhost:8546",
                    "mnemonic": "test test junk",
                    "num_accounts": "3"
                }
            }"#,
        );

        assert_eq!(registry.len(), 2);

        let ropsten = registry.get("ropsten").unwrap();
        assert_eq!(ropsten.url(), "http://localhost:8545");
        assert_eq!(ropsten.keystore_dir(), Some(Path::new("/keys/ropsten")));
        assert!(ropsten.mnemonic().is_none());

        let dev = registry.get("dev").unwrap();
        assert_eq!(dev.url(), "ws://localhost:8546");
        assert!(dev.keystore_dir().is_none());
        assert!(dev.mnemonic().is_some());
        assert_eq!(dev.num_accounts(), 3);
    }

    #[test]
    fn num_accounts_defaults_when_absent() {
        let registry = parse(r#"{"dev": {"url": "http://x", "mnemonic": "words"}}"#);
        assert_eq!(registry.get("dev").unwrap().num_accounts(), DEFAULT_ACCOUNT_COUNT);
    }

    #[test]
    fn num_accounts_defaults_when_malformed() {
        let registry = parse(
            r#"{"dev": {"url": "http://x", "mnemonic": "words", "num_accounts": "abc"}}"#,
        );
        assert_eq!(registry.get("dev").unwrap().num_accounts(), DEFAULT_ACCOUNT_COUNT);
    }

    #[test]
    fn empty_strings_mean_not_configured() {
        let registry = parse(
            r#"{"dev": {"url": "http://x", "keystore": "", "passphrase": "", "mnemonic": ""}}"#,
        );
        let config = registry.get("dev").unwrap();
        assert!(config.keystore_dir().is_none());
        assert!(config.passphrase().is_none());
        assert!(config.mnemonic().is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Registry::load("/nonexistent/networks.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_source_is_parse_error() {
        let err = Registry::from_reader("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_configs_round_trip() {
        let registry = Registry::from_configs([
            NetworkConfig::new("mainnet", "http://a"),
            NetworkConfig::new("testnet", "http://b"),
        ]);
        assert_eq!(registry.get("mainnet").unwrap().url(), "http://a");
        let mut names: Vec<_> = registry.names().collect();
        names.sort_unstable();
        assert_eq!(names, ["mainnet", "testnet"]);
    }

    #[test]
    fn debug_redacts_secrets() {
        let registry = parse(
            r#"{"dev": {"url": "http://x", "mnemonic": "top secret words", "passphrase": "hunter2"}}"#,
        );
        let debug = format!("{:?}", registry.get("dev").unwrap());
        assert!(!debug.contains("top secret words"));
        assert!(!debug.contains("hunter2"));
    }
}
