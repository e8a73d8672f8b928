//! Session identity
//!
//! Exactly one [`Identity`] is active at a time. The [`IdentityProvider`]
//! owns it and counts every change in an epoch, so holders of an old
//! snapshot can tell they are stale without watching a global.

mod wallet;

pub use wallet::{
    negotiate_network, ChainDescriptor, ChainSwitch, ExternalWallet, NativeCurrency,
    UNKNOWN_CHAIN_CODE, USER_REJECTED_CODE,
};

#[cfg(test)]
pub(crate) use wallet::mock;

use crate::error::WalletError;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Where an identity's signing capability comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningMeans {
    /// Key generated in-process for this session
    GeneratedKey,
    /// Signing delegated to an external wallet
    ExternalWallet,
}

/// Address plus signing capability used to authorize contract calls
#[derive(Clone)]
pub struct Identity {
    address: String,
    key: Option<Arc<SigningKey>>,
}

impl Identity {
    /// Create an identity backed by a fresh Ed25519 key
    pub fn generate() -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let digest = Sha256::digest(key.verifying_key().to_bytes());
        // Last 20 bytes of the key hash, 0x-prefixed
        let address = format!("0x{}", hex::encode(&digest[12..]));

        Self {
            address,
            key: Some(Arc::new(key)),
        }
    }

    /// Create an identity for an address controlled by an external wallet
    pub fn external(address: impl Into<String>) -> Result<Self, WalletError> {
        let address = address.into();
        if !is_valid_address(&address) {
            return Err(WalletError::InvalidAddress(address));
        }
        Ok(Self { address, key: None })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn signing_means(&self) -> SigningMeans {
        if self.key.is_some() {
            SigningMeans::GeneratedKey
        } else {
            SigningMeans::ExternalWallet
        }
    }

    /// Sign `payload` with the local key. External identities sign in their wallet.
    pub fn sign(&self, payload: &[u8]) -> Option<String> {
        self.key
            .as_ref()
            .map(|key| hex::encode(key.sign(payload).to_bytes()))
    }

    /// Hex verifying key of a generated identity
    pub fn public_key_hex(&self) -> Option<String> {
        self.key
            .as_ref()
            .map(|key| hex::encode(key.verifying_key().to_bytes()))
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("signing_means", &self.signing_means())
            .finish()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.address.eq_ignore_ascii_case(&other.address)
            && self.signing_means() == other.signing_means()
    }
}

/// `0x` followed by 40 hex digits
pub fn is_valid_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Identity captured together with the epoch it belonged to
#[derive(Debug, Clone)]
pub struct IdentitySnapshot {
    pub identity: Identity,
    pub epoch: u64,
}

#[derive(Debug, Default)]
struct ProviderState {
    active: Option<Identity>,
    epoch: u64,
}

/// Holder of the single active identity
///
/// # Example
///
/// ```rust,ignore
/// let provider = IdentityProvider::new(Duration::from_millis(100));
///
/// // Starts with a generated identity
/// assert!(provider.is_connected());
///
/// // Switch to a browser wallet
/// provider.connect_external(&wallet, &ChainDescriptor::studio()).await?;
///
/// // Back to a generated identity after the reconnect delay
/// provider.disconnect();
/// ```
#[derive(Debug)]
pub struct IdentityProvider {
    state: RwLock<ProviderState>,
    reconnect_delay: Duration,
}

impl IdentityProvider {
    /// Create a provider with a freshly generated identity installed
    pub fn new(reconnect_delay: Duration) -> Arc<Self> {
        let provider = Arc::new(Self {
            state: RwLock::new(ProviderState::default()),
            reconnect_delay,
        });
        provider.connect_generated();
        provider
    }

    /// Snapshot of the active identity, `None` during the reconnect window
    pub fn get_active(&self) -> Option<Identity> {
        self.read_state().active.clone()
    }

    /// Active identity together with the current epoch, read atomically
    pub fn snapshot(&self) -> Option<IdentitySnapshot> {
        let state = self.read_state();
        state.active.clone().map(|identity| IdentitySnapshot {
            identity,
            epoch: state.epoch,
        })
    }

    /// Number of identity changes so far
    pub fn epoch(&self) -> u64 {
        self.read_state().epoch
    }

    pub fn is_connected(&self) -> bool {
        self.read_state().active.is_some()
    }

    /// Replace the active identity with a newly generated one
    pub fn connect_generated(&self) -> Identity {
        let identity = Identity::generate();
        let epoch = self.install(Some(identity.clone()));
        tracing::info!(address = %identity.address(), epoch = epoch, "Generated session identity");
        identity
    }

    /// Connect an external wallet: negotiate the network, then adopt its first account
    pub async fn connect_external<W>(
        &self,
        wallet: &W,
        chain: &ChainDescriptor,
    ) -> Result<Identity, WalletError>
    where
        W: ExternalWallet + ?Sized,
    {
        if !wallet.is_available() {
            tracing::warn!("External wallet requested but none is installed");
            return Err(WalletError::WalletUnavailable);
        }

        negotiate_network(wallet, chain).await?;

        let accounts = wallet.request_accounts().await?;
        let address = accounts.into_iter().next().ok_or(WalletError::NoAccounts)?;
        let identity = Identity::external(address)?;

        let epoch = self.install(Some(identity.clone()));
        tracing::info!(address = %identity.address(), epoch = epoch, "Connected external wallet");
        Ok(identity)
    }

    /// Drop the active identity now; a generated one replaces it after the
    /// reconnect delay unless another identity was installed meanwhile.
    pub fn disconnect(self: &Arc<Self>) {
        let epoch = self.install(None);
        tracing::info!(epoch = epoch, "Disconnected identity");

        let provider = Arc::clone(self);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(provider.reconnect_delay).await;
                    provider.reconnect_if_unchanged(epoch);
                });
            }
            Err(_) => {
                tracing::warn!("No async runtime, regenerating identity immediately");
                provider.reconnect_if_unchanged(epoch);
            }
        }
    }

    fn reconnect_if_unchanged(&self, expected_epoch: u64) {
        let identity = Identity::generate();
        let mut state = self.write_state();
        if state.epoch != expected_epoch {
            tracing::debug!(
                expected_epoch = expected_epoch,
                epoch = state.epoch,
                "Identity changed during reconnect delay, keeping it"
            );
            return;
        }
        state.epoch += 1;
        tracing::info!(address = %identity.address(), epoch = state.epoch, "Generated session identity");
        state.active = Some(identity);
    }

    fn install(&self, identity: Option<Identity>) -> u64 {
        let mut state = self.write_state();
        state.epoch += 1;
        state.active = identity;
        state.epoch
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, ProviderState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, ProviderState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
